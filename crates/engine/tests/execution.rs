//! End-to-end execution against the pet schema.

mod common;

use common::{fido, parse_document, pet_schema, variables, BoomMessage, CallLog, QueryRoot};
use engine::{IntrospectionState, Request, Response};
use serde_json::{json, Value};

fn execute(query: &str, request: Request) -> Response {
    pet_schema().execute(parse_document(query), request)
}

fn response_json(response: &Response) -> Value {
    serde_json::to_value(response).expect("responses serialize")
}

#[test]
fn resolves_a_basic_query() {
    let response = execute(
        "{ dog { name } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"name": "Fido"}}})
    );
}

#[test]
fn aliases_rename_response_keys() {
    let response = execute(
        "{ d: dog { n: name } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(response_json(&response), json!({"data": {"d": {"n": "Fido"}}}));
}

#[test]
fn null_for_non_null_field_bubbles_to_nullable_parent() {
    let response = execute(
        "{ dog { name } }",
        Request::new().with_data(QueryRoot(json!({"dog": {"name": null}}))),
    );
    assert_eq!(
        response_json(&response),
        json!({
            "data": {"dog": null},
            "errors": [{
                "message": "Cannot return null for non-nullable field Dog.name",
                "locations": [{"line": 1, "column": 9}],
                "path": ["dog", "name"],
            }],
        })
    );
}

#[test]
fn skip_directive_removes_the_selection() {
    let response = execute(
        "query($s: Boolean!) { dog { name nickname @skip(if: $s) } }",
        Request::new()
            .with_variables(variables(json!({"s": true})))
            .with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"name": "Fido"}}})
    );
}

#[test]
fn include_false_is_equivalent_to_skip_true() {
    let skipped = execute(
        "{ dog { name nickname @skip(if: true) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    let excluded = execute(
        "{ dog { name nickname @include(if: false) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(response_json(&skipped), response_json(&excluded));
    assert_eq!(
        response_json(&skipped),
        json!({"data": {"dog": {"name": "Fido"}}})
    );
}

#[test]
fn skip_and_include_must_both_allow_the_selection() {
    let response = execute(
        "{ dog { name nickname @skip(if: false) @include(if: false) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"name": "Fido"}}})
    );

    let response = execute(
        "{ dog { nickname @skip(if: false) @include(if: true) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"nickname": "Fi"}}})
    );
}

#[test]
fn enum_arguments_reach_the_resolver() {
    let response = execute(
        "{ dog { doesKnowCommand(dogCommand: SIT) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"doesKnowCommand": true}}})
    );

    let response = execute(
        "{ dog { doesKnowCommand(dogCommand: HEEL) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"doesKnowCommand": false}}})
    );
}

#[test]
fn unknown_enum_value_is_reported() {
    let response = execute(
        "{ dog { doesKnowCommand(dogCommand: SLEEP) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    let json = response_json(&response);
    assert_eq!(json["data"], json!({"dog": null}));
    assert_eq!(
        json["errors"][0]["message"],
        json!("Unknown DogCommand enum value: SLEEP for dogCommand")
    );
    assert_eq!(json["errors"][0]["path"], json!(["dog", "doesKnowCommand"]));
}

#[test]
fn enum_serialization_maps_internal_values_to_names() {
    let response = execute(
        "{ status dog { favoriteCommand } }",
        Request::new().with_data(QueryRoot(json!({"status": 1, "dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"status": "ACTIVE", "dog": {"favoriteCommand": "SIT"}}})
    );
}

#[test]
fn enum_serialization_rejects_undeclared_values() {
    let response = execute(
        "{ status }",
        Request::new().with_data(QueryRoot(json!({"status": 9}))),
    );
    let json = response_json(&response);
    assert_eq!(json["data"], json!({"status": null}));
    assert_eq!(
        json["errors"][0]["message"],
        json!("Enum \"Status\" cannot represent value: 9")
    );
}

#[test]
fn interface_values_resolve_to_their_concrete_type() {
    let response = execute(
        "{ pet { __typename name ... on Dog { barkVolume } } }",
        Request::new().with_data(QueryRoot(json!({"pet": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"pet": {"__typename": "Dog", "name": "Fido", "barkVolume": 42}}})
    );
}

#[test]
fn union_members_pick_their_own_inline_fragment() {
    let response = execute(
        "{ catOrDog { ... on Cat { meowVolume } ... on Dog { barkVolume } } }",
        Request::new().with_data(QueryRoot(
            json!({"catOrDog": {"__typename": "Cat", "meowVolume": 5}}),
        )),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"catOrDog": {"meowVolume": 5}}})
    );
}

#[test]
fn interface_fragments_apply_to_implementing_objects() {
    let response = execute(
        "{ dog { ... on Pet { name } barkVolume } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"name": "Fido", "barkVolume": 42}}})
    );
}

#[test]
fn fragment_cycles_terminate() {
    let response = execute(
        "{ dog { ...A } } fragment A on Dog { ...A name }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"name": "Fido"}}})
    );
}

#[test]
fn response_keys_follow_collection_order() {
    let response = execute(
        "{ dog { nickname name barkVolume } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"dog":{"nickname":"Fi","name":"Fido","barkVolume":42}}}"#
    );
}

#[test]
fn fragment_expansion_preserves_first_appearance_order() {
    let response = execute(
        "{ dog { ...Names barkVolume } } fragment Names on Dog { name nickname }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"dog":{"name":"Fido","nickname":"Fi","barkVolume":42}}}"#
    );
}

#[test]
fn failed_non_null_list_element_nulls_the_whole_list() {
    let response = execute(
        "{ luckyNumbers }",
        Request::new().with_data(QueryRoot(json!({"luckyNumbers": [1, null, 3]}))),
    );
    let json = response_json(&response);
    assert_eq!(json["data"], json!({"luckyNumbers": null}));
    assert_eq!(json["errors"][0]["path"], json!(["luckyNumbers", 1]));
    assert_eq!(
        json["errors"][0]["message"],
        json!("Cannot return null for non-nullable field Query.luckyNumbers")
    );
}

#[test]
fn failed_nullable_list_element_nulls_only_itself() {
    let response = execute(
        "{ maybeNumbers }",
        Request::new().with_data(QueryRoot(json!({"maybeNumbers": [1, null, "x"]}))),
    );
    let json = response_json(&response);
    assert_eq!(json["data"], json!({"maybeNumbers": [1, null, null]}));
    assert_eq!(json["errors"][0]["path"], json!(["maybeNumbers", 2]));
}

#[test]
fn single_values_complete_as_one_element_lists() {
    let response = execute(
        "{ tags }",
        Request::new().with_data(QueryRoot(json!({"tags": "solo"}))),
    );
    assert_eq!(response_json(&response), json!({"data": {"tags": ["solo"]}}));
}

#[test]
fn omitted_arguments_fall_back_to_defaults() {
    let response = execute(
        "{ dog { isHousetrained } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"isHousetrained": true}}})
    );

    let response = execute(
        "{ dog { isHousetrained(atOtherHomes: false) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"isHousetrained": false}}})
    );
}

#[test]
fn variable_defaults_apply_when_no_value_is_provided() {
    let response = execute(
        "query($c: DogCommand = SIT) { dog { doesKnowCommand(dogCommand: $c) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"doesKnowCommand": true}}})
    );
}

#[test]
fn string_variables_coerce_to_enums() {
    let response = execute(
        "query($c: DogCommand!) { dog { doesKnowCommand(dogCommand: $c) } }",
        Request::new()
            .with_variables(variables(json!({"c": "DOWN"})))
            .with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"doesKnowCommand": true}}})
    );
}

#[test]
fn missing_required_variable_is_a_request_error() {
    let response = execute(
        "query($s: Boolean!) { dog { name nickname @skip(if: $s) } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    let json = response_json(&response);
    assert!(json.get("data").is_none());
    assert_eq!(
        json["errors"][0]["message"],
        json!("Variable $s of required type Boolean! was not provided.")
    );
}

#[test]
fn invalid_variable_value_is_a_request_error() {
    let response = execute(
        "query($s: Boolean!) { dog { name nickname @skip(if: $s) } }",
        Request::new()
            .with_variables(variables(json!({"s": "yes"})))
            .with_data(QueryRoot(json!({"dog": fido()}))),
    );
    let json = response_json(&response);
    assert!(json.get("data").is_none());
    assert_eq!(
        json["errors"][0]["message"],
        json!("Variable $s got an invalid value: Boolean cannot represent a value of kind string: \"yes\" for s")
    );
}

#[test]
fn unknown_operation_name_is_a_request_error() {
    let response = execute(
        "{ dog { name } }",
        Request::new()
            .with_operation_name("Nope")
            .with_data(QueryRoot(json!({"dog": fido()}))),
    );
    let json = response_json(&response);
    assert!(json.get("data").is_none());
    assert_eq!(
        json["errors"][0]["message"],
        json!("Unknown operation named \"Nope\".")
    );
}

#[test]
fn multiple_operations_require_a_name() {
    let source = "query A { dog { name } } query B { dog { nickname } }";

    let response = execute(
        source,
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response)["errors"][0]["message"],
        json!("Operation name required in a document that defines multiple operations.")
    );

    let response = execute(
        source,
        Request::new()
            .with_operation_name("B")
            .with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"dog": {"nickname": "Fi"}}})
    );
}

#[test]
fn typename_resolves_on_every_object() {
    let response = execute(
        "{ __typename dog { __typename owner { __typename } } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {
            "__typename": "Query",
            "dog": {"__typename": "Dog", "owner": {"__typename": "Human"}},
        }})
    );
}

#[test]
fn lazy_values_are_forced_during_completion() {
    let response = execute(
        "{ lazyDog { name barkVolume } }",
        Request::new().with_data(QueryRoot(json!({"dog": fido()}))),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"lazyDog": {"name": "Fido", "barkVolume": 42}}})
    );
}

#[test]
fn resolver_errors_without_a_message_become_internal_errors() {
    let response = execute("{ boom }", Request::new().with_data(QueryRoot(json!({}))));
    let json = response_json(&response);
    assert_eq!(json["data"], json!({"boom": null}));
    assert_eq!(json["errors"][0]["message"], json!("Internal server error"));
    assert_eq!(json["errors"][0]["path"], json!(["boom"]));
}

#[test]
fn resolver_error_messages_are_preserved() {
    let response = execute(
        "{ boom }",
        Request::new()
            .with_data(QueryRoot(json!({})))
            .with_data(BoomMessage("the dog ate it".to_string())),
    );
    let json = response_json(&response);
    assert_eq!(json["errors"][0]["message"], json!("the dog ate it"));
}

#[test]
fn mutations_run_serially_in_document_order() {
    let log = CallLog::default();
    let response = execute(
        "mutation { b: bump a: bump }",
        Request::new().with_data(log.clone()),
    );
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"b":1,"a":2}}"#
    );
    assert_eq!(*log.0.lock().unwrap(), vec!["bump", "bump"]);
}

#[test]
fn schema_introspection_serves_the_root_types() {
    let response = execute(
        "{ __schema { queryType { name } mutationType { name } } }",
        Request::new(),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"__schema": {
            "queryType": {"name": "Query"},
            "mutationType": {"name": "Mutation"},
        }}})
    );
}

#[test]
fn type_introspection_lists_fields_in_declaration_order() {
    let response = execute(
        r#"{ __type(name: "Cat") { kind name fields { name type { kind ofType { name } } } } }"#,
        Request::new(),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"__type": {
            "kind": "OBJECT",
            "name": "Cat",
            "fields": [
                {"name": "name", "type": {"kind": "NON_NULL", "ofType": {"name": "String"}}},
                {"name": "nickname", "type": {"kind": "SCALAR", "ofType": null}},
                {"name": "meowVolume", "type": {"kind": "SCALAR", "ofType": null}},
            ],
        }}})
    );
}

#[test]
fn unknown_type_introspection_is_null() {
    let response = execute(r#"{ __type(name: "Ghost") { name } }"#, Request::new());
    assert_eq!(response_json(&response), json!({"data": {"__type": null}}));
}

#[test]
fn disabled_introspection_rejects_schema_queries() {
    use engine::registry::{MetaField, ObjectType};

    let schema = engine::Schema::build(ObjectType::new("Query", [MetaField::new("x", "Int")]))
        .disable_introspection()
        .finish()
        .expect("schema builds");

    let response = schema.execute(
        parse_document("{ __schema { queryType { name } } }"),
        Request::new(),
    );
    let json = response_json(&response);
    assert_eq!(json["data"], json!(null));
    assert_eq!(
        json["errors"][0]["message"],
        json!("Unauthorized for introspection.")
    );

    let response = schema.execute(
        parse_document("{ __schema { queryType { name } } }"),
        Request::new().with_introspection_state(IntrospectionState::ForceEnabled),
    );
    assert_eq!(
        response_json(&response),
        json!({"data": {"__schema": {"queryType": {"name": "Query"}}}})
    );
}
