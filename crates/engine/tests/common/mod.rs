//! Test support: parse query strings with `graphql-parser` into the
//! engine's document model, and the pet schema the execution tests run
//! against.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use engine::ast::types::{
    BaseType, Directive, DocumentOperations, ExecutableDocument, Field, FragmentDefinition,
    FragmentSpread, InlineFragment, OperationDefinition, OperationType, Selection, SelectionSet,
    Type, TypeCondition, VariableDefinition,
};
use engine::ast::{Pos, Positioned};
use engine::registry::{
    EnumType, InterfaceType, MetaEnumValue, MetaField, MetaInputValue, ObjectType, UnionType,
};
use engine::resolvers::{
    PropertyResolver, PropertyTypeResolver, RawValue, ResolvedValue, Resolver, ResolverContext,
};
use engine::{ConstValue, Error, Name, Schema, Value, Variables};
use graphql_parser::query as q;
use graphql_parser::Pos as GraphqlParserPos;
use serde_json::json;

/// The root object the `Query` resolver serves fields from.
pub struct QueryRoot(pub serde_json::Value);

/// Message for the always-failing `boom` field.
pub struct BoomMessage(pub String);

/// Records the order mutation fields were resolved in.
#[derive(Clone, Default)]
pub struct CallLog(pub Arc<Mutex<Vec<String>>>);

pub fn parse_document(source: &str) -> ExecutableDocument {
    let document = graphql_parser::parse_query::<String>(source).expect("test document parses");

    let mut operations = Vec::new();
    let mut fragments = HashMap::new();

    for definition in document.definitions {
        match definition {
            q::Definition::Operation(operation) => operations.push(convert_operation(operation)),
            q::Definition::Fragment(fragment) => {
                let q::TypeCondition::On(on) = fragment.type_condition;
                fragments.insert(
                    Name::new(fragment.name),
                    Positioned::new(
                        FragmentDefinition {
                            type_condition: Positioned::new(
                                TypeCondition {
                                    on: Positioned::new(Name::new(on), convert_pos(fragment.position)),
                                },
                                convert_pos(fragment.position),
                            ),
                            directives: convert_directives(fragment.directives),
                            selection_set: convert_selection_set(fragment.selection_set),
                        },
                        convert_pos(fragment.position),
                    ),
                );
            }
        }
    }

    let operations = if operations.len() == 1 && operations[0].0.is_none() {
        DocumentOperations::Single(operations.into_iter().next().unwrap().1)
    } else {
        DocumentOperations::Multiple(
            operations
                .into_iter()
                .map(|(name, operation)| (name.expect("multiple operations are named"), operation))
                .collect(),
        )
    };

    ExecutableDocument { operations, fragments }
}

fn convert_operation(
    operation: q::OperationDefinition<'_, String>,
) -> (Option<Name>, Positioned<OperationDefinition>) {
    match operation {
        q::OperationDefinition::SelectionSet(selection_set) => {
            let pos = convert_pos(selection_set.span.0);
            (
                None,
                Positioned::new(
                    OperationDefinition {
                        ty: OperationType::Query,
                        variable_definitions: Vec::new(),
                        directives: Vec::new(),
                        selection_set: convert_selection_set(selection_set),
                    },
                    pos,
                ),
            )
        }
        q::OperationDefinition::Query(query) => (
            query.name.map(Name::new),
            convert_operation_parts(
                OperationType::Query,
                query.position,
                query.variable_definitions,
                query.directives,
                query.selection_set,
            ),
        ),
        q::OperationDefinition::Mutation(mutation) => (
            mutation.name.map(Name::new),
            convert_operation_parts(
                OperationType::Mutation,
                mutation.position,
                mutation.variable_definitions,
                mutation.directives,
                mutation.selection_set,
            ),
        ),
        q::OperationDefinition::Subscription(subscription) => (
            subscription.name.map(Name::new),
            convert_operation_parts(
                OperationType::Subscription,
                subscription.position,
                subscription.variable_definitions,
                subscription.directives,
                subscription.selection_set,
            ),
        ),
    }
}

fn convert_operation_parts(
    ty: OperationType,
    position: GraphqlParserPos,
    variable_definitions: Vec<q::VariableDefinition<'_, String>>,
    directives: Vec<q::Directive<'_, String>>,
    selection_set: q::SelectionSet<'_, String>,
) -> Positioned<OperationDefinition> {
    Positioned::new(
        OperationDefinition {
            ty,
            variable_definitions: variable_definitions
                .into_iter()
                .map(|definition| {
                    let pos = convert_pos(definition.position);
                    Positioned::new(
                        VariableDefinition {
                            name: Positioned::new(Name::new(definition.name), pos),
                            var_type: Positioned::new(convert_type(definition.var_type), pos),
                            default_value: definition.default_value.map(|value| {
                                Positioned::new(
                                    convert_value(value)
                                        .into_const()
                                        .expect("variable defaults are literals"),
                                    pos,
                                )
                            }),
                        },
                        pos,
                    )
                })
                .collect(),
            directives: convert_directives(directives),
            selection_set: convert_selection_set(selection_set),
        },
        convert_pos(position),
    )
}

fn convert_selection_set(selection_set: q::SelectionSet<'_, String>) -> Positioned<SelectionSet> {
    let pos = convert_pos(selection_set.span.0);
    Positioned::new(
        SelectionSet {
            items: selection_set
                .items
                .into_iter()
                .map(|selection| match selection {
                    q::Selection::Field(field) => {
                        let pos = convert_pos(field.position);
                        Positioned::new(
                            Selection::Field(Positioned::new(
                                Field {
                                    alias: field.alias.map(|alias| Positioned::new(Name::new(alias), pos)),
                                    name: Positioned::new(Name::new(field.name), pos),
                                    arguments: convert_arguments(field.arguments, pos),
                                    directives: convert_directives(field.directives),
                                    selection_set: convert_selection_set(field.selection_set),
                                },
                                pos,
                            )),
                            pos,
                        )
                    }
                    q::Selection::FragmentSpread(spread) => {
                        let pos = convert_pos(spread.position);
                        Positioned::new(
                            Selection::FragmentSpread(Positioned::new(
                                FragmentSpread {
                                    fragment_name: Positioned::new(Name::new(spread.fragment_name), pos),
                                    directives: convert_directives(spread.directives),
                                },
                                pos,
                            )),
                            pos,
                        )
                    }
                    q::Selection::InlineFragment(fragment) => {
                        let pos = convert_pos(fragment.position);
                        Positioned::new(
                            Selection::InlineFragment(Positioned::new(
                                InlineFragment {
                                    type_condition: fragment.type_condition.map(|condition| {
                                        let q::TypeCondition::On(on) = condition;
                                        Positioned::new(
                                            TypeCondition {
                                                on: Positioned::new(Name::new(on), pos),
                                            },
                                            pos,
                                        )
                                    }),
                                    directives: convert_directives(fragment.directives),
                                    selection_set: convert_selection_set(fragment.selection_set),
                                },
                                pos,
                            )),
                            pos,
                        )
                    }
                })
                .collect(),
        },
        pos,
    )
}

fn convert_directives(directives: Vec<q::Directive<'_, String>>) -> Vec<Positioned<Directive>> {
    directives
        .into_iter()
        .map(|directive| {
            let pos = convert_pos(directive.position);
            Positioned::new(
                Directive {
                    name: Positioned::new(Name::new(directive.name), pos),
                    arguments: convert_arguments(directive.arguments, pos),
                },
                pos,
            )
        })
        .collect()
}

fn convert_arguments(
    arguments: Vec<(String, q::Value<'_, String>)>,
    pos: Pos,
) -> Vec<(Positioned<Name>, Positioned<Value>)> {
    arguments
        .into_iter()
        .map(|(name, value)| {
            (
                Positioned::new(Name::new(name), pos),
                Positioned::new(convert_value(value), pos),
            )
        })
        .collect()
}

fn convert_value(value: q::Value<'_, String>) -> Value {
    match value {
        q::Value::Variable(name) => Value::Variable(Name::new(name)),
        q::Value::Int(n) => Value::Number(n.as_i64().expect("int literal fits i64").into()),
        q::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        q::Value::String(s) => Value::String(s),
        q::Value::Boolean(b) => Value::Boolean(b),
        q::Value::Null => Value::Null,
        q::Value::Enum(name) => Value::Enum(Name::new(name)),
        q::Value::List(items) => Value::List(items.into_iter().map(convert_value).collect()),
        q::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (Name::new(key), convert_value(value)))
                .collect(),
        ),
    }
}

fn convert_type(ty: q::Type<'_, String>) -> Type {
    match ty {
        q::Type::NamedType(name) => Type {
            base: BaseType::Named(Name::new(name)),
            nullable: true,
        },
        q::Type::ListType(inner) => Type {
            base: BaseType::List(Box::new(convert_type(*inner))),
            nullable: true,
        },
        q::Type::NonNullType(inner) => Type {
            nullable: false,
            ..convert_type(*inner)
        },
    }
}

fn convert_pos(pos: GraphqlParserPos) -> Pos {
    Pos::new(pos.line, pos.column)
}

fn resolve_query(ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
    match ctx.field_name {
        "lazyDog" => {
            let dog = ctx
                .data::<QueryRoot>()?
                .0
                .get("dog")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Ok(RawValue::lazy(move || Ok(ResolvedValue::new(dog))))
        }
        "boom" => Err(Error::new(
            ctx.data_opt::<BoomMessage>().map(|m| m.0.as_str()).unwrap_or(""),
        )),
        name => {
            let root = &ctx.data::<QueryRoot>()?.0;
            Ok(RawValue::from(
                root.get(name).cloned().unwrap_or(serde_json::Value::Null),
            ))
        }
    }
}

fn resolve_dog(ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
    match ctx.field_name {
        "doesKnowCommand" => {
            let command = match ctx.arg("dogCommand") {
                Some(ConstValue::Enum(name)) => name.as_str().to_string(),
                other => return Err(Error::new(format!("unexpected dogCommand: {other:?}"))),
            };
            let knows = ctx
                .parent
                .get_field("knownCommands")
                .map(|commands| {
                    commands
                        .data_resolved()
                        .as_array()
                        .is_some_and(|array| array.iter().any(|c| c == &json!(command)))
                })
                .unwrap_or(false);
            Ok(RawValue::from(serde_json::Value::Bool(knows)))
        }
        "isHousetrained" => Ok(RawValue::from(serde_json::Value::Bool(matches!(
            ctx.arg("atOtherHomes"),
            Some(ConstValue::Boolean(true))
        )))),
        _ => PropertyResolver.resolve(ctx),
    }
}

fn resolve_mutation(ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
    let log = ctx.data::<CallLog>()?;
    let mut calls = log.0.lock().unwrap();
    calls.push(ctx.field_name.to_string());
    Ok(RawValue::from(json!(calls.len())))
}

/// The pet schema the execution tests run against.
pub fn pet_schema() -> Schema {
    let query = ObjectType::new(
        "Query",
        [
            MetaField::new("dog", "Dog"),
            MetaField::new("pet", "Pet"),
            MetaField::new("catOrDog", "CatOrDog"),
            MetaField::new("human", "Human"),
            MetaField::new("lazyDog", "Dog"),
            MetaField::new("luckyNumbers", "[Int!]"),
            MetaField::new("maybeNumbers", "[Int]"),
            MetaField::new("tags", "[String]"),
            MetaField::new("status", "Status"),
            MetaField::new("boom", "Int"),
        ],
    )
    .with_resolver(resolve_query);

    let dog = ObjectType::new(
        "Dog",
        [
            MetaField::new("id", "ID!"),
            MetaField::new("name", "String!"),
            MetaField::new("nickname", "String"),
            MetaField::new("barkVolume", "Int"),
            MetaField::new("favoriteCommand", "DogCommand"),
            MetaField::new("doesKnowCommand", "Boolean!")
                .with_argument(MetaInputValue::new("dogCommand", "DogCommand!")),
            MetaField::new("isHousetrained", "Boolean!").with_argument(
                MetaInputValue::new("atOtherHomes", "Boolean")
                    .with_default(ConstValue::Boolean(true)),
            ),
            MetaField::new("owner", "Human"),
        ],
    )
    .implement("Pet")
    .with_resolver(resolve_dog);

    let cat = ObjectType::new(
        "Cat",
        [
            MetaField::new("name", "String!"),
            MetaField::new("nickname", "String"),
            MetaField::new("meowVolume", "Int"),
        ],
    )
    .implement("Pet");

    let mutation = ObjectType::new("Mutation", [MetaField::new("bump", "Int!")])
        .with_resolver(resolve_mutation);

    Schema::build(query)
        .mutation(mutation)
        .register(dog)
        .register(cat)
        .register(InterfaceType::new(
            "Pet",
            [MetaField::new("name", "String!")],
            PropertyTypeResolver,
        ))
        .register(UnionType::new(
            "CatOrDog",
            ["Cat", "Dog"],
            PropertyTypeResolver,
        ))
        .register(ObjectType::new(
            "Human",
            [
                MetaField::new("name", "String!"),
                MetaField::new("pets", "[Pet]"),
            ],
        ))
        .register(EnumType::new(
            "DogCommand",
            ["SIT", "DOWN", "HEEL"].map(MetaEnumValue::new),
        ))
        .register(EnumType::new(
            "Status",
            [
                MetaEnumValue::new("ACTIVE").with_value(ConstValue::from_json(json!(1))),
                MetaEnumValue::new("INACTIVE").with_value(ConstValue::from_json(json!(2))),
            ],
        ))
        .finish()
        .expect("pet schema builds")
}

/// The dog every test starts from.
pub fn fido() -> serde_json::Value {
    json!({
        "__typename": "Dog",
        "id": 1,
        "name": "Fido",
        "nickname": "Fi",
        "barkVolume": 42,
        "favoriteCommand": "SIT",
        "knownCommands": ["SIT", "DOWN"],
        "owner": {"name": "Alice"},
    })
}

pub fn variables(value: serde_json::Value) -> Variables {
    serde_json::from_value(value).expect("variables deserialize")
}
