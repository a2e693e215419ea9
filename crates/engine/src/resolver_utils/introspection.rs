//! The synthetic `__schema` and `__type` fields of the root query type.

use engine_ast::{types::Field, Positioned};
use engine_value::ConstValue;

use super::field::complete_value;
use crate::{
    context::{Context, ContextExt, ContextField},
    registry::{introspection, MetaTypeName},
    resolvers::ResolvedValue,
    ServerError, ServerResult,
};

pub(super) fn resolve_schema_field<'a>(
    ctx_field: &ContextField<'a>,
    fields: &[&'a Positioned<Field>],
) -> ServerResult<ConstValue> {
    complete_value(
        ctx_field,
        &ctx_field.path,
        MetaTypeName::create("__Schema!"),
        fields,
        ResolvedValue::new(introspection::schema_root_node()),
    )
}

pub(super) fn resolve_type_field<'a>(
    ctx_field: &ContextField<'a>,
    fields: &[&'a Positioned<Field>],
) -> ServerResult<ConstValue> {
    let field = ctx_field.item;
    let Some(argument) = field.node.get_argument("name") else {
        return Err(ctx_field.set_error_path(ServerError::new(
            "__type requires its `name` argument",
            Some(field.pos),
        )));
    };

    let value = argument
        .node
        .clone()
        .into_const_with(|name| ctx_field.var_value(&name, argument.pos))?;
    let ConstValue::String(name) = value else {
        return Err(ctx_field.set_error_path(ServerError::new(
            "__type expects a String for `name`",
            Some(argument.pos),
        )));
    };

    if ctx_field.registry().lookup_type(&name).is_none() {
        return Ok(ConstValue::Null);
    }

    complete_value(
        ctx_field,
        &ctx_field.path,
        MetaTypeName::create("__Type"),
        fields,
        ResolvedValue::new(introspection::named_type_node(&name)),
    )
}
