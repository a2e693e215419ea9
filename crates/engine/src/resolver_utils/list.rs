//! List completion: per-index error paths, element nullability, and the
//! singleton coercion of bare values.

use engine_ast::{types::Field, Positioned};
use engine_value::ConstValue;

use super::field::complete_value;
use crate::{
    context::{ContextExt, ContextField},
    query_path::QueryPath,
    registry::MetaTypeName,
    resolvers::ResolvedValue,
    ServerResult,
};

/// Completes a raw value against a list type. A bare value that is not a
/// list is treated as a one-element list.
pub(super) fn complete_list<'a>(
    ctx_field: &ContextField<'a>,
    path: &QueryPath,
    inner: &str,
    fields: &[&'a Positioned<Field>],
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    let element_ty = MetaTypeName::create(inner);

    if !value.data_resolved().is_array() {
        return complete_value(ctx_field, path, element_ty, fields, value)
            .map(|completed| ConstValue::List(vec![completed]));
    }

    let items: Vec<_> = value.item_iter().expect("checked to be an array").collect();
    let mut completed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let item_path = path.child(index);
        match complete_value(ctx_field, &item_path, element_ty, fields, item) {
            Ok(value) => completed.push(value),
            Err(error) if !element_ty.is_non_null() => {
                // A nullable element absorbs its own failure.
                ctx_field.add_error(error);
                completed.push(ConstValue::Null);
            }
            // A failed non-null element nulls the whole list.
            Err(error) => return Err(error),
        }
    }
    Ok(ConstValue::List(completed))
}
