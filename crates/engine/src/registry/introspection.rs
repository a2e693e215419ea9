//! The built-in introspection types and the resolvers that serve them
//! straight from the registry.
//!
//! Type references travel as small JSON nodes: wrappers as
//! `{"kind": "NON_NULL" | "LIST", "ofType": ...}` chains ending in a
//! `{"name": ...}` node; the `__Type` resolver expands named nodes from the
//! registry on demand, so recursive schemas never materialize eagerly.

use engine_value::ConstValue;
use serde_json::{json, Value};

use super::{
    DirectiveLocation, EnumType, MetaDirective, MetaEnumValue, MetaField, MetaInputValue, MetaType,
    MetaTypeName, ObjectType, Registry,
};
use crate::{
    resolvers::{RawValue, Resolver, ResolverContext},
    Error,
};

/// Registers `__Schema`, `__Type` and the rest of the introspection types.
pub(crate) fn register(registry: &mut Registry) {
    registry.insert_type(EnumType::new(
        "__TypeKind",
        [
            "SCALAR",
            "OBJECT",
            "INTERFACE",
            "UNION",
            "ENUM",
            "INPUT_OBJECT",
            "LIST",
            "NON_NULL",
        ]
        .map(MetaEnumValue::new),
    ));

    registry.insert_type(EnumType::new(
        "__DirectiveLocation",
        [
            DirectiveLocation::Query,
            DirectiveLocation::Mutation,
            DirectiveLocation::Subscription,
            DirectiveLocation::Field,
            DirectiveLocation::FragmentDefinition,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
            DirectiveLocation::VariableDefinition,
            DirectiveLocation::Schema,
            DirectiveLocation::Scalar,
            DirectiveLocation::Object,
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::ArgumentDefinition,
            DirectiveLocation::Interface,
            DirectiveLocation::Union,
            DirectiveLocation::Enum,
            DirectiveLocation::EnumValue,
            DirectiveLocation::InputObject,
            DirectiveLocation::InputFieldDefinition,
        ]
        .map(|location| MetaEnumValue::new(location.as_str())),
    ));

    registry.insert_type(
        ObjectType::new(
            "__Schema",
            [
                MetaField::new("description", "String"),
                MetaField::new("types", "[__Type!]!"),
                MetaField::new("queryType", "__Type!"),
                MetaField::new("mutationType", "__Type"),
                MetaField::new("subscriptionType", "__Type"),
                MetaField::new("directives", "[__Directive!]!"),
            ],
        )
        .with_resolver(SchemaIntrospection),
    );

    let include_deprecated = || {
        MetaInputValue::new("includeDeprecated", "Boolean")
            .with_default(ConstValue::Boolean(false))
    };

    registry.insert_type(
        ObjectType::new(
            "__Type",
            [
                MetaField::new("kind", "__TypeKind!"),
                MetaField::new("name", "String"),
                MetaField::new("description", "String"),
                MetaField::new("specifiedByURL", "String"),
                MetaField::new("fields", "[__Field!]").with_argument(include_deprecated()),
                MetaField::new("interfaces", "[__Type!]"),
                MetaField::new("possibleTypes", "[__Type!]"),
                MetaField::new("enumValues", "[__EnumValue!]").with_argument(include_deprecated()),
                MetaField::new("inputFields", "[__InputValue!]"),
                MetaField::new("ofType", "__Type"),
            ],
        )
        .with_resolver(TypeIntrospection),
    );

    registry.insert_type(ObjectType::new(
        "__Field",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("args", "[__InputValue!]!"),
            MetaField::new("type", "__Type!"),
            MetaField::new("isDeprecated", "Boolean!"),
            MetaField::new("deprecationReason", "String"),
        ],
    ));

    registry.insert_type(ObjectType::new(
        "__InputValue",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("type", "__Type!"),
            MetaField::new("defaultValue", "String"),
        ],
    ));

    registry.insert_type(ObjectType::new(
        "__EnumValue",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("isDeprecated", "Boolean!"),
            MetaField::new("deprecationReason", "String"),
        ],
    ));

    registry.insert_type(ObjectType::new(
        "__Directive",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("locations", "[__DirectiveLocation!]!"),
            MetaField::new("args", "[__InputValue!]!"),
            MetaField::new("isRepeatable", "Boolean!"),
        ],
    ));
}

/// The raw value behind the synthetic `__schema` field.
pub(crate) fn schema_root_node() -> Value {
    json!({"__schema": true})
}

/// The raw value of a `__Type` position naming a registered type.
pub(crate) fn named_type_node(name: &str) -> Value {
    json!({ "name": name })
}

/// A type reference as nested wrapper nodes over a named node.
fn type_ref_node(ty: &str) -> Value {
    match MetaTypeName::create(ty) {
        MetaTypeName::NonNull(inner) => json!({"kind": "NON_NULL", "ofType": type_ref_node(inner)}),
        MetaTypeName::List(inner) => json!({"kind": "LIST", "ofType": type_ref_node(inner)}),
        MetaTypeName::Named(name) => named_type_node(name),
    }
}

fn input_value_node(input: &MetaInputValue) -> Value {
    json!({
        "name": input.name,
        "description": input.description,
        "type": type_ref_node(input.ty.as_str()),
        "defaultValue": input.default_value.as_ref().map(ConstValue::to_string),
    })
}

fn field_node(field: &MetaField) -> Value {
    json!({
        "name": field.name,
        "description": field.description,
        "args": field.args.values().map(input_value_node).collect::<Vec<_>>(),
        "type": type_ref_node(field.ty.as_str()),
        "isDeprecated": field.deprecation.is_deprecated(),
        "deprecationReason": field.deprecation.reason(),
    })
}

fn enum_value_node(value: &MetaEnumValue) -> Value {
    json!({
        "name": value.name,
        "description": value.description,
        "isDeprecated": value.deprecation.is_deprecated(),
        "deprecationReason": value.deprecation.reason(),
    })
}

fn directive_node(directive: &MetaDirective) -> Value {
    json!({
        "name": directive.name,
        "description": directive.description,
        "locations": directive
            .locations
            .iter()
            .map(|location| location.as_str())
            .collect::<Vec<_>>(),
        "args": directive.args.values().map(input_value_node).collect::<Vec<_>>(),
        "isRepeatable": directive.is_repeatable,
    })
}

/// Serves the fields of `__Schema`.
struct SchemaIntrospection;

impl Resolver for SchemaIntrospection {
    fn resolve(&self, ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
        let registry = ctx.registry;
        let value = match ctx.field_name {
            "types" => Value::Array(
                registry
                    .types
                    .keys()
                    .map(|name| named_type_node(name))
                    .collect(),
            ),
            "queryType" => named_type_node(&registry.query_type),
            "mutationType" => registry
                .mutation_type
                .as_deref()
                .map_or(Value::Null, named_type_node),
            "subscriptionType" => registry
                .subscription_type
                .as_deref()
                .map_or(Value::Null, named_type_node),
            "directives" => Value::Array(registry.directives.values().map(directive_node).collect()),
            _ => Value::Null,
        };
        Ok(RawValue::from(value))
    }
}

/// Serves the fields of `__Type`, expanding named nodes from the registry.
struct TypeIntrospection;

impl Resolver for TypeIntrospection {
    fn resolve(&self, ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
        let parent = ctx.parent.data_resolved();

        if let Some(kind @ ("NON_NULL" | "LIST")) = parent.get("kind").and_then(Value::as_str) {
            let value = match ctx.field_name {
                "kind" => json!(kind),
                "ofType" => parent.get("ofType").cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            return Ok(RawValue::from(value));
        }

        let ty = parent
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| ctx.registry.lookup_type(name));
        let Some(ty) = ty else {
            return Ok(RawValue::null());
        };

        let include_deprecated = matches!(
            ctx.arg("includeDeprecated"),
            Some(ConstValue::Boolean(true))
        );

        let value = match ctx.field_name {
            "kind" => json!(ty.kind()),
            "name" => json!(ty.name()),
            "description" => json!(ty.description()),
            "specifiedByURL" => match ty {
                MetaType::Scalar(scalar) => json!(scalar.specified_by_url),
                _ => Value::Null,
            },
            "fields" => match ty.fields() {
                Some(fields) => Value::Array(
                    fields
                        .values()
                        .filter(|field| include_deprecated || !field.deprecation.is_deprecated())
                        .map(field_node)
                        .collect(),
                ),
                None => Value::Null,
            },
            "interfaces" => match ty {
                MetaType::Object(object) => Value::Array(
                    object
                        .implements
                        .iter()
                        .map(|name| named_type_node(name))
                        .collect(),
                ),
                MetaType::Interface(_) => json!([]),
                _ => Value::Null,
            },
            "possibleTypes" => match ty.possible_types() {
                Some(possible_types) => Value::Array(
                    possible_types.iter().map(|name| named_type_node(name)).collect(),
                ),
                None => Value::Null,
            },
            "enumValues" => match ty {
                MetaType::Enum(enum_type) => Value::Array(
                    enum_type
                        .values
                        .values()
                        .filter(|value| include_deprecated || !value.deprecation.is_deprecated())
                        .map(enum_value_node)
                        .collect(),
                ),
                _ => Value::Null,
            },
            "inputFields" => match ty {
                MetaType::InputObject(input_object) => Value::Array(
                    input_object.input_fields.values().map(input_value_node).collect(),
                ),
                _ => Value::Null,
            },
            _ => Value::Null,
        };

        Ok(RawValue::from(value))
    }
}
