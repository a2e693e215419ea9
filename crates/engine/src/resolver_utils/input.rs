//! Input coercion: variables once per operation, arguments once per field.

use std::borrow::{Borrow, Cow};

use engine_ast::{types::OperationDefinition, Pos};
use engine_value::{ConstValue, Name, Value, Variables};
use indexmap::IndexMap;

use crate::{
    context::{Context, ContextExt, ContextField},
    registry::{scalars, MetaInputValue, MetaType, MetaTypeName, Registry},
    Error, ServerError, ServerResult,
};

/// Coerces one input position: an argument, a directive argument or an input
/// object field. `None` out means the position stays absent.
pub fn resolve_input(
    registry: &Registry,
    error_pos: Pos,
    arg_name: &str,
    meta_input_value: &MetaInputValue,
    value: Option<ConstValue>,
) -> ServerResult<Option<ConstValue>> {
    resolve_maybe_absent_input(
        ResolveContext {
            registry,
            path: PathNode::new(arg_name),
            ty: Cow::Borrowed(meta_input_value.ty.as_str()),
            allow_list_coercion: true,
            default_value: meta_input_value.default_value.as_ref(),
        },
        value,
    )
    .map_err(|err| err.into_server_error(error_pos))
}

/// Coerces the declared arguments of a field into the ordered map handed to
/// its resolver.
pub fn resolve_arguments(
    ctx: &ContextField<'_>,
    meta_args: &IndexMap<String, MetaInputValue>,
) -> ServerResult<IndexMap<Name, ConstValue>> {
    let mut coerced = IndexMap::with_capacity(meta_args.len());
    for meta in meta_args.values() {
        let ast_value = ctx.item.node.get_argument(&meta.name);
        let value = match ast_value {
            Some(pos_value) => match &pos_value.node {
                // An unset variable without a default leaves the argument
                // absent, so the declared argument default can still apply.
                Value::Variable(var_name) => variable_or_definition_default(ctx, var_name),
                _ => Some(
                    pos_value
                        .node
                        .clone()
                        .into_const_with(|name| ctx.var_value(&name, pos_value.pos))?,
                ),
            },
            None => None,
        };
        let pos = ast_value.map_or(ctx.item.pos, |value| value.pos);
        if let Some(value) = resolve_input(ctx.registry(), pos, &meta.name, meta, value)? {
            coerced.insert(Name::new(&meta.name), value);
        }
    }
    Ok(coerced)
}

fn variable_or_definition_default(ctx: &ContextField<'_>, name: &Name) -> Option<ConstValue> {
    if let Some(value) = ctx.query_env.variables.get(name) {
        return Some(value.clone());
    }
    ctx.query_env
        .operation
        .node
        .variable_definitions
        .iter()
        .find(|def| def.node.name.node == *name)
        .and_then(|def| def.node.default_value())
        .cloned()
}

/// Coerces the raw variable map against the operation's variable
/// definitions. Runs once, before execution; every failure is a request
/// error.
pub fn coerce_variables(
    registry: &Registry,
    operation: &OperationDefinition,
    variables: &Variables,
) -> Result<Variables, Vec<ServerError>> {
    let mut coerced = Variables::default();
    let mut errors = Vec::new();

    for def in &operation.variable_definitions {
        let name = &def.node.name.node;
        let ty = def.node.var_type.node.to_string();

        let provided = variables.get(name).cloned();
        let has_value = provided.as_ref().is_some_and(|value| !value.is_null());

        if !has_value {
            if let Some(default) = def.node.default_value() {
                coerced.insert(name.clone(), default.clone());
                continue;
            }
            if MetaTypeName::create(&ty).is_non_null() {
                errors.push(ServerError::new(
                    format!("Variable ${name} of required type {ty} was not provided."),
                    Some(def.pos),
                ));
                continue;
            }
            // An explicit null is kept; a missing entry stays unset.
            if provided.is_some() {
                coerced.insert(name.clone(), ConstValue::Null);
            }
            continue;
        }

        let rctx = ResolveContext {
            registry,
            path: PathNode::new(name.as_str()),
            ty: Cow::Borrowed(&ty),
            allow_list_coercion: true,
            default_value: None,
        };
        match resolve_present_input(rctx, provided.expect("has_value checked")) {
            Ok(value) => {
                coerced.insert(name.clone(), value);
            }
            Err(error) => errors.push(ServerError::new(
                format!("Variable ${name} got an invalid value: {}", error.message),
                Some(def.pos),
            )),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Linked path through nested input positions, so coercion errors can say
/// where they happened without allocating on the happy path.
#[derive(Clone, Copy)]
struct PathNode<'a> {
    name: &'a str,
    previous: Option<&'a PathNode<'a>>,
}

impl<'a> PathNode<'a> {
    fn new(name: &'a str) -> PathNode<'a> {
        PathNode { name, previous: None }
    }

    fn with(&'a self, name: &'a str) -> PathNode<'a> {
        PathNode {
            name,
            previous: Some(self),
        }
    }

    fn into_vec(self) -> Vec<String> {
        let mut previous = self
            .previous
            .map(|node| node.into_vec())
            .unwrap_or_default();
        previous.push(self.name.to_string());
        previous
    }
}

#[derive(Clone)]
struct ResolveContext<'a> {
    registry: &'a Registry,
    path: PathNode<'a>,
    /// Expected GraphQL type of this position.
    ty: Cow<'a, str>,
    /// Whether a bare value may be wrapped into a one-element list here.
    /// True except inside a multi-element list literal.
    allow_list_coercion: bool,
    default_value: Option<&'a ConstValue>,
}

impl<'a> ResolveContext<'a> {
    fn with_input(&'a self, path: &'a str, input: &'a MetaInputValue) -> ResolveContext<'a> {
        ResolveContext {
            registry: self.registry,
            path: self.path.with(path),
            ty: Cow::Borrowed(input.ty.as_str()),
            allow_list_coercion: true,
            default_value: input.default_value.as_ref(),
        }
    }

    fn input_error(self, expected: &str) -> Error {
        Error::new(format!("{expected} for {}", self.path.into_vec().join(".")))
    }
}

fn resolve_maybe_absent_input(
    rctx: ResolveContext<'_>,
    value: Option<ConstValue>,
) -> Result<Option<ConstValue>, Error> {
    match value.or_else(|| rctx.default_value.cloned()) {
        Some(value) => resolve_present_input(rctx, value).map(Some),
        None => matches!(MetaTypeName::create(rctx.ty.borrow()), MetaTypeName::NonNull(_))
            .then_some(Err(rctx.input_error("Unexpected null value")))
            .transpose(),
    }
}

fn resolve_present_input(rctx: ResolveContext<'_>, value: ConstValue) -> Result<ConstValue, Error> {
    match MetaTypeName::create(rctx.ty.borrow()) {
        MetaTypeName::NonNull(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Err(rctx.input_error("Unexpected null value"));
            }
            resolve_present_input(
                ResolveContext {
                    ty: Cow::Borrowed(type_name),
                    ..rctx
                },
                value,
            )
        }
        MetaTypeName::List(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            if let ConstValue::List(list) = value {
                let rctx = ResolveContext {
                    ty: Cow::Borrowed(type_name),
                    allow_list_coercion: list.len() <= 1,
                    default_value: None,
                    ..rctx
                };
                let mut arr = Vec::new();
                for (idx, element) in list.into_iter().enumerate() {
                    let path = idx.to_string();
                    let rctx = ResolveContext {
                        path: rctx.path.with(&path),
                        ..rctx.clone()
                    };
                    arr.push(resolve_present_input(rctx, element)?);
                }
                Ok(ConstValue::List(arr))
            } else if rctx.allow_list_coercion {
                Ok(ConstValue::List(vec![resolve_present_input(
                    ResolveContext {
                        ty: Cow::Borrowed(type_name),
                        allow_list_coercion: true,
                        default_value: None,
                        ..rctx
                    },
                    value,
                )?]))
            } else {
                Err(rctx.input_error("Expected a List"))
            }
        }
        MetaTypeName::Named(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            match rctx.registry.lookup_type(type_name) {
                Some(MetaType::InputObject(input_object)) => {
                    if let ConstValue::Object(mut fields) = value {
                        let mut map = IndexMap::with_capacity(fields.len());
                        for meta_input_value in input_object.input_fields.values() {
                            if let Some(field_value) = resolve_maybe_absent_input(
                                rctx.with_input(&meta_input_value.name, meta_input_value),
                                fields.shift_remove(meta_input_value.name.as_str()),
                            )? {
                                map.insert(Name::new(&meta_input_value.name), field_value);
                            }
                        }
                        Ok(ConstValue::Object(map))
                    } else {
                        Err(rctx.input_error("Expected an Object"))
                    }
                }
                Some(MetaType::Enum(enum_type)) => {
                    let name = match &value {
                        ConstValue::Enum(name) => name.as_str(),
                        ConstValue::String(string) => string.as_str(),
                        _ => {
                            return Err(rctx.input_error(&format!(
                                "Expected an enum, not a {}",
                                value.kind_str()
                            )))
                        }
                    };
                    match enum_type.value(name) {
                        Some(meta_value) => Ok(meta_value.internal_value()),
                        None => Err(rctx.input_error(&format!(
                            "Unknown {} enum value: {name}",
                            enum_type.name
                        ))),
                    }
                }
                Some(MetaType::Scalar(scalar)) => {
                    scalars::parse(scalar, value).map_err(|error| {
                        Error::new(format!(
                            "{} for {}",
                            error.message,
                            rctx.path.into_vec().join(".")
                        ))
                    })
                }
                Some(_) => Err(rctx
                    .clone()
                    .input_error(&format!("Internal Error: Unsupported input type {type_name}"))),
                None => Err(rctx
                    .clone()
                    .input_error(&format!("Unknown type {type_name}"))),
            }
        }
    }
}
