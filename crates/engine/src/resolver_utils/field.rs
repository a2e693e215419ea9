//! Per-field work: synthetic fields, resolver invocation and value
//! completion, with the recover-or-propagate rule for errors.

use engine_ast::{types::Field, Pos, Positioned};
use engine_value::ConstValue;

use super::{
    container::resolve_merged_selection_sets, input::resolve_arguments, introspection,
    list::complete_list,
};
use crate::{
    context::{Context, ContextExt, ContextField, ContextSelectionSet},
    query_path::QueryPath,
    registry::{scalars, EnumType, MetaType, MetaTypeName},
    resolvers::{ResolvedValue, ResolverContext, TypeResolver},
    Error, ServerError, ServerResult,
};

/// Resolves one response key of a selection set. `fields` are all the field
/// nodes grouped under the key; the first is the representative for name and
/// arguments, the whole list feeds child selection-set merging.
pub fn resolve_field<'a>(
    ctx: &ContextSelectionSet<'a>,
    fields: &[&'a Positioned<Field>],
    parent: &ResolvedValue,
) -> ServerResult<ConstValue> {
    let field = fields[0];
    let ctx_field = ctx.with_field(field);
    let field_name = field.node.name.node.as_str();

    if field_name == "__typename" {
        return Ok(ConstValue::String(ctx.ty.name.clone()));
    }

    if ctx.ty.name == ctx.registry().query_type
        && matches!(field_name, "__schema" | "__type")
    {
        if !ctx.introspection_enabled() {
            return Err(ctx_field.set_error_path(ServerError::new(
                "Unauthorized for introspection.",
                Some(field.node.name.pos),
            )));
        }
        return match field_name {
            "__schema" => introspection::resolve_schema_field(&ctx_field, fields),
            _ => introspection::resolve_type_field(&ctx_field, fields),
        };
    }

    let Some(meta_field) = ctx.ty.field_by_name(field_name) else {
        return Err(ctx_field.set_error_path(ServerError::new(
            format!("Unknown field \"{field_name}\" on type \"{}\".", ctx.ty.name),
            Some(field.node.name.pos),
        )));
    };

    let result = resolve_field_value(&ctx_field, fields, parent, meta_field);

    match result {
        Ok(value) => Ok(value),
        Err(error) if meta_field.ty.is_nullable() => {
            ctx_field.add_error(ctx_field.set_error_path(error));
            Ok(ConstValue::Null)
        }
        // Propagate to the nearest nullable ancestor, which nulls out.
        Err(error) => Err(ctx_field.set_error_path(error)),
    }
}

fn resolve_field_value(
    ctx_field: &ContextField<'_>,
    fields: &[&Positioned<Field>],
    parent: &ResolvedValue,
    meta_field: &crate::registry::MetaField,
) -> ServerResult<ConstValue> {
    let field = ctx_field.item;
    let args = resolve_arguments(ctx_field, &meta_field.args)?;

    let resolver_ctx = ResolverContext::new(
        ctx_field.registry(),
        &ctx_field.query_env.ctx_data,
        &ctx_field.schema_env.data,
        parent,
        &field.node.name.node,
        &args,
    );

    let raw = ctx_field
        .parent_type
        .resolver
        .resolve(resolver_ctx)
        .map_err(|error| resolver_error(error, field.pos))?;
    let value = raw.force().map_err(|error| resolver_error(error, field.pos))?;

    complete_value(
        ctx_field,
        &ctx_field.path,
        MetaTypeName::create(meta_field.ty.as_str()),
        fields,
        value,
    )
}

/// A resolver failure becomes a field error; one without a message is
/// reported as an internal error.
fn resolver_error(error: Error, pos: Pos) -> ServerError {
    if error.message.is_empty() {
        ServerError::new("Internal server error", Some(pos))
    } else {
        error.into_server_error(pos)
    }
}

/// Completes a raw value against the expected type, recursing through the
/// wrapping modifiers. `path` is where the value sits in the response; it
/// diverges from `ctx_field.path` inside lists.
pub(super) fn complete_value<'a>(
    ctx_field: &ContextField<'a>,
    path: &QueryPath,
    ty: MetaTypeName<'_>,
    fields: &[&'a Positioned<Field>],
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    match ty {
        MetaTypeName::NonNull(inner) => {
            if value.is_null() {
                return Err(null_for_non_null(ctx_field, path));
            }
            let completed =
                complete_value(ctx_field, path, MetaTypeName::create(inner), fields, value)?;
            if completed.is_null() {
                return Err(null_for_non_null(ctx_field, path));
            }
            Ok(completed)
        }
        _ if value.is_null() => Ok(ConstValue::Null),
        MetaTypeName::List(inner) => complete_list(ctx_field, path, inner, fields, value),
        MetaTypeName::Named(type_name) => {
            match ctx_field.registry().lookup_type(type_name) {
                Some(MetaType::Scalar(scalar)) => scalars::serialize(scalar, value.take())
                    .map_err(|error| error_at(ctx_field, path, error.message)),
                Some(MetaType::Enum(enum_type)) => complete_enum(ctx_field, path, enum_type, value),
                Some(MetaType::Object(object)) => {
                    let ctx_obj = ContextSelectionSet {
                        ty: object,
                        path: path.clone(),
                        item: &fields[0].node.selection_set,
                        schema_env: ctx_field.schema_env,
                        query_env: ctx_field.query_env,
                    };
                    resolve_merged_selection_sets(&ctx_obj, fields, &value)
                }
                Some(abstract_ty @ (MetaType::Interface(_) | MetaType::Union(_))) => {
                    let type_resolver = match abstract_ty {
                        MetaType::Interface(interface) => &interface.type_resolver,
                        MetaType::Union(union) => &union.type_resolver,
                        _ => unreachable!(),
                    };
                    complete_abstract(ctx_field, path, abstract_ty, type_resolver, fields, value)
                }
                Some(MetaType::InputObject(_)) => Err(error_at(
                    ctx_field,
                    path,
                    format!("Field resolved to input object type \"{type_name}\""),
                )),
                None => Err(error_at(
                    ctx_field,
                    path,
                    format!("Unknown type \"{type_name}\" in field position"),
                )),
            }
        }
    }
}

/// Runs the type resolver of an abstract type and completes against the
/// concrete object it picked.
fn complete_abstract<'a>(
    ctx_field: &ContextField<'a>,
    path: &QueryPath,
    abstract_ty: &MetaType,
    type_resolver: &std::sync::Arc<dyn TypeResolver>,
    fields: &[&'a Positioned<Field>],
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    let concrete_name = type_resolver
        .resolve_type(&value, &ctx_field.query_env.ctx_data)
        .map_err(|error| error_at(ctx_field, path, error.message))?;

    let Some(MetaType::Object(object)) = ctx_field.registry().lookup_type(&concrete_name) else {
        return Err(error_at(
            ctx_field,
            path,
            format!(
                "Abstract type \"{}\" resolved to \"{concrete_name}\", which is not an object type",
                abstract_ty.name()
            ),
        ));
    };

    if !abstract_ty.is_possible_type(&concrete_name) {
        return Err(error_at(
            ctx_field,
            path,
            format!(
                "\"{concrete_name}\" is not a possible type of \"{}\"",
                abstract_ty.name()
            ),
        ));
    }

    let ctx_obj = ContextSelectionSet {
        ty: object,
        path: path.clone(),
        item: &fields[0].node.selection_set,
        schema_env: ctx_field.schema_env,
        query_env: ctx_field.query_env,
    };
    resolve_merged_selection_sets(&ctx_obj, fields, &value)
}

/// Maps the raw internal value back to the declared name of the enum value.
fn complete_enum(
    ctx_field: &ContextField<'_>,
    path: &QueryPath,
    enum_type: &EnumType,
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    let raw = ConstValue::from_json(value.take());

    for enum_value in enum_type.values.values() {
        let matches = match &enum_value.value {
            Some(internal) => *internal == raw,
            None => match &raw {
                ConstValue::String(name) => *name == enum_value.name,
                ConstValue::Enum(name) => *name == enum_value.name,
                _ => false,
            },
        };
        if matches {
            return Ok(ConstValue::Enum(enum_value.name.as_str().into()));
        }
    }

    Err(error_at(
        ctx_field,
        path,
        format!("Enum \"{}\" cannot represent value: {raw}", enum_type.name),
    ))
}

pub(super) fn null_for_non_null(ctx_field: &ContextField<'_>, path: &QueryPath) -> ServerError {
    tracing::warn!(
        field = %format_args!("{}.{}", ctx_field.parent_type.name, ctx_field.item.node.name.node),
        path = %path,
        "non-nullable field resolved to null",
    );
    error_at(
        ctx_field,
        path,
        format!(
            "Cannot return null for non-nullable field {}.{}",
            ctx_field.parent_type.name, ctx_field.item.node.name.node
        ),
    )
}

pub(super) fn error_at(
    ctx_field: &ContextField<'_>,
    path: &QueryPath,
    message: impl Into<String>,
) -> ServerError {
    ServerError {
        path: path.to_vec(),
        ..ServerError::new(message, Some(ctx_field.item.pos))
    }
}
