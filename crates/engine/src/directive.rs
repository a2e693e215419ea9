//! Evaluation of the executable directives during field collection.
//!
//! Only `@skip` and `@include` change execution; any other directive on a
//! selection is accepted and ignored.

use engine_ast::{types::Directive, Positioned};
use engine_value::ConstValue;

use crate::{
    context::{Context, ContextExt, ContextSelectionSet},
    registry::MetaInputValue,
    resolver_utils::resolve_input,
    ServerError, ServerResult,
};

/// Whether the selection carrying `directives` is excluded from the grouped
/// fields. A selection stays included iff no `@skip(if: true)` and no
/// `@include(if: false)` is present.
pub(crate) fn selection_skipped(
    ctx: &ContextSelectionSet<'_>,
    directives: &[Positioned<Directive>],
) -> ServerResult<bool> {
    for directive in directives {
        let name = directive.node.name.node.as_str();
        let skip = match name {
            "skip" => true,
            "include" => false,
            _ => continue,
        };

        match condition(ctx, &directive.node, directive.pos)? {
            true if skip => return Ok(true),
            false if !skip => return Ok(true),
            _ => {}
        }
    }
    Ok(false)
}

/// The `if:` argument, coerced with the same rules as field arguments.
fn condition(
    ctx: &ContextSelectionSet<'_>,
    directive: &Directive,
    pos: engine_ast::Pos,
) -> ServerResult<bool> {
    let Some(argument) = directive.get_argument("if") else {
        return Err(ServerError::new(
            format!("Directive @{} is missing its required argument `if`", directive.name.node),
            Some(pos),
        ));
    };

    let value = argument
        .node
        .clone()
        .into_const_with(|name| ctx.var_value(&name, argument.pos))?;

    let meta = MetaInputValue::new("if", "Boolean!");
    match resolve_input(ctx.registry(), argument.pos, "if", &meta, Some(value))? {
        Some(ConstValue::Boolean(value)) => Ok(value),
        _ => Err(ServerError::new(
            format!("Directive @{} expects a Boolean for `if`", directive.name.node),
            Some(argument.pos),
        )),
    }
}
