//! Selection set execution: grouping fields and resolving each group in
//! order.

use std::collections::HashSet;

use engine_ast::{
    types::{Field, Selection, SelectionSet},
    Positioned,
};
use engine_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::{
    context::{Context, ContextExt, ContextSelectionSet},
    directive::selection_skipped,
    registry::{MetaType, ObjectType},
    resolvers::ResolvedValue,
    ServerError, ServerResult,
};

/// Executes a selection set against `ctx.ty` and produces the ordered
/// response map. Fields resolve one after another in collection order, which
/// is also what keeps mutation root fields serial.
pub fn resolve_container<'a>(
    ctx: &ContextSelectionSet<'a>,
    parent: &ResolvedValue,
) -> ServerResult<ConstValue> {
    let mut grouped = IndexMap::new();
    let mut visited_fragments = HashSet::new();
    collect_fields(ctx, &ctx.item.node, &mut visited_fragments, &mut grouped)?;
    resolve_grouped(ctx, grouped, parent)
}

/// Executes the merged child selection sets of all fields sharing one
/// response key.
pub(crate) fn resolve_merged_selection_sets<'a>(
    ctx: &ContextSelectionSet<'a>,
    fields: &[&'a Positioned<Field>],
    parent: &ResolvedValue,
) -> ServerResult<ConstValue> {
    let mut grouped = IndexMap::new();
    let mut visited_fragments = HashSet::new();
    for field in fields {
        let ctx = ctx.with_selection_set(&field.node.selection_set);
        collect_fields(&ctx, &ctx.item.node, &mut visited_fragments, &mut grouped)?;
    }
    resolve_grouped(ctx, grouped, parent)
}

fn resolve_grouped<'a>(
    ctx: &ContextSelectionSet<'a>,
    grouped: IndexMap<&'a str, Vec<&'a Positioned<Field>>>,
    parent: &ResolvedValue,
) -> ServerResult<ConstValue> {
    let mut map = IndexMap::with_capacity(grouped.len());
    for (response_key, fields) in grouped {
        let value = super::field::resolve_field(ctx, &fields, parent)?;
        map.insert(Name::new(response_key), value);
    }
    Ok(ConstValue::Object(map))
}

/// Flattens a selection set into the ordered grouping of
/// `response_key -> [field]`, honoring directives, fragment type conditions
/// and the fragment cycle guard.
pub fn collect_fields<'a>(
    ctx: &ContextSelectionSet<'a>,
    selection_set: &'a SelectionSet,
    visited_fragments: &mut HashSet<Name>,
    grouped: &mut IndexMap<&'a str, Vec<&'a Positioned<Field>>>,
) -> ServerResult<()> {
    for selection in &selection_set.items {
        if selection_skipped(ctx, selection.node.directives())? {
            continue;
        }

        match &selection.node {
            Selection::Field(field) => {
                grouped
                    .entry(field.node.response_key().node.as_str())
                    .or_default()
                    .push(field);
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                // Re-entering a fragment is where a spread cycle is broken.
                if !visited_fragments.insert(name.clone()) {
                    continue;
                }
                let Some(fragment) = ctx.get_fragment(name) else {
                    return Err(ServerError::new(
                        format!(r#"Unknown fragment "{name}"."#),
                        Some(spread.pos),
                    ));
                };
                if does_fragment_type_apply(ctx, ctx.ty, &fragment.type_condition.node.on.node) {
                    collect_fields(
                        ctx,
                        &fragment.selection_set.node,
                        visited_fragments,
                        grouped,
                    )?;
                }
            }
            Selection::InlineFragment(fragment) => {
                let applies = match &fragment.node.type_condition {
                    Some(condition) => {
                        does_fragment_type_apply(ctx, ctx.ty, &condition.node.on.node)
                    }
                    None => true,
                };
                if applies {
                    collect_fields(
                        ctx,
                        &fragment.node.selection_set.node,
                        visited_fragments,
                        grouped,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Whether a fragment conditioned on `fragment_type` may be spread into a
/// selection on `object`.
pub fn does_fragment_type_apply(
    ctx: &ContextSelectionSet<'_>,
    object: &ObjectType,
    fragment_type: &str,
) -> bool {
    if object.name == fragment_type {
        return true;
    }
    match ctx.registry().lookup_type(fragment_type) {
        Some(MetaType::Interface(interface)) => {
            ctx.registry().type_implements(&object.name, fragment_type)
                || interface.possible_types.contains(&object.name)
        }
        Some(MetaType::Union(union)) => union.possible_types.contains(&object.name),
        _ => false,
    }
}
