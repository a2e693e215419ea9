//! The boundary with user code: field resolvers, type resolvers for abstract
//! types, and the raw values they hand back.

use std::{
    fmt::{self, Debug, Formatter},
    sync::{Arc, Mutex},
};

use engine_value::{ConstValue, Name};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::{context::Data, query_path::QueryPathSegment, registry::Registry, Error};

/// Everything a resolver gets to see for one field.
pub struct ResolverContext<'a> {
    /// The schema's type registry.
    pub registry: &'a Registry,
    /// The parent object's raw value.
    pub parent: &'a ResolvedValue,
    /// The name of the field being resolved (never the alias).
    pub field_name: &'a str,
    /// Coerced argument values, in declaration order.
    pub args: &'a IndexMap<Name, ConstValue>,
    ctx_data: &'a Data,
    schema_data: &'a Data,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        ctx_data: &'a Data,
        schema_data: &'a Data,
        parent: &'a ResolvedValue,
        field_name: &'a str,
        args: &'a IndexMap<Name, ConstValue>,
    ) -> Self {
        ResolverContext {
            registry,
            parent,
            field_name,
            args,
            ctx_data,
            schema_data,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&ConstValue> {
        self.args.get(name)
    }

    /// Host data registered on the request or the schema; the
    /// request-scoped value wins when both exist.
    pub fn data<D: std::any::Any + Send + Sync>(&self) -> Result<&'a D, Error> {
        self.data_opt::<D>().ok_or_else(|| {
            Error::new(format!("Data `{}` does not exist.", std::any::type_name::<D>()))
        })
    }

    pub fn data_opt<D: std::any::Any + Send + Sync>(&self) -> Option<&'a D> {
        self.ctx_data
            .get::<D>()
            .or_else(|| self.schema_data.get::<D>())
    }
}

/// Produces the raw value of a field. Attached to every object type.
pub trait Resolver: Send + Sync {
    fn resolve(&self, ctx: ResolverContext<'_>) -> Result<RawValue, Error>;
}

impl<F> Resolver for F
where
    F: Fn(ResolverContext<'_>) -> Result<RawValue, Error> + Send + Sync,
{
    fn resolve(&self, ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
        self(ctx)
    }
}

/// Resolves a field by reading the property of the same name off the parent
/// value; missing properties resolve to null. The default for data-backed
/// object types.
pub struct PropertyResolver;

impl Resolver for PropertyResolver {
    fn resolve(&self, ctx: ResolverContext<'_>) -> Result<RawValue, Error> {
        Ok(RawValue::ready(
            ctx.parent
                .get_field(ctx.field_name)
                .unwrap_or_else(ResolvedValue::null),
        ))
    }
}

/// Picks the concrete object type behind an interface or union value.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, value: &ResolvedValue, data: &Data) -> Result<String, Error>;
}

impl<F> TypeResolver for F
where
    F: Fn(&ResolvedValue, &Data) -> Result<String, Error> + Send + Sync,
{
    fn resolve_type(&self, value: &ResolvedValue, data: &Data) -> Result<String, Error> {
        self(value, data)
    }
}

/// Reads the concrete type name from a `__typename` property on the value.
pub struct PropertyTypeResolver;

impl TypeResolver for PropertyTypeResolver {
    fn resolve_type(&self, value: &ResolvedValue, _data: &Data) -> Result<String, Error> {
        match value.get_field("__typename").map(ResolvedValue::take) {
            Some(Value::String(name)) => Ok(name),
            _ => Err(Error::new(
                "Abstract type value carries no usable __typename property",
            )),
        }
    }
}

/// What a resolver hands back: data that is ready now, or a deferred
/// computation the engine forces when completion reaches it.
pub enum RawValue {
    Ready(ResolvedValue),
    Lazy(Lazy),
}

impl RawValue {
    pub fn ready(value: impl Into<ResolvedValue>) -> Self {
        RawValue::Ready(value.into())
    }

    pub fn null() -> Self {
        RawValue::Ready(ResolvedValue::null())
    }

    pub fn lazy(f: impl FnOnce() -> Result<ResolvedValue, Error> + Send + Sync + 'static) -> Self {
        RawValue::Lazy(Lazy::new(f))
    }

    /// The concrete value, forcing a lazy if necessary.
    pub fn force(self) -> Result<ResolvedValue, Error> {
        match self {
            RawValue::Ready(value) => Ok(value),
            RawValue::Lazy(lazy) => {
                tracing::debug!("forcing lazy resolver value");
                lazy.resolve().cloned()
            }
        }
    }
}

impl From<ResolvedValue> for RawValue {
    fn from(value: ResolvedValue) -> Self {
        RawValue::Ready(value)
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Ready(ResolvedValue::new(value))
    }
}

impl From<ConstValue> for RawValue {
    fn from(value: ConstValue) -> Self {
        RawValue::Ready(value.into())
    }
}

/// A deferred raw value. Forcing is idempotent: the thunk runs at most once
/// and its outcome, success or failure, is what every later call observes.
pub struct Lazy {
    thunk: Mutex<Option<LazyThunk>>,
    cell: OnceCell<Result<ResolvedValue, Error>>,
}

type LazyThunk = Box<dyn FnOnce() -> Result<ResolvedValue, Error> + Send + Sync>;

impl Lazy {
    pub fn new(f: impl FnOnce() -> Result<ResolvedValue, Error> + Send + Sync + 'static) -> Self {
        Lazy {
            thunk: Mutex::new(Some(Box::new(f))),
            cell: OnceCell::new(),
        }
    }

    /// Forces the computation and returns the outcome.
    pub fn resolve(&self) -> Result<&ResolvedValue, Error> {
        self.cell
            .get_or_init(|| {
                let thunk = self
                    .thunk
                    .lock()
                    .expect("lazy thunk lock")
                    .take()
                    .expect("lazy thunk runs at most once");
                thunk()
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The forced value, or `None` if the lazy has not been forced or failed.
    pub fn value(&self) -> Option<&ResolvedValue> {
        self.cell.get().and_then(|result| result.as_ref().ok())
    }
}

impl Debug for Lazy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").field("forced", &self.cell.get().is_some()).finish()
    }
}

/// A raw value passed between the engine and resolvers.
///
/// The JSON blob is shared; sub-values are addressed by path, so taking the
/// field of an object or the element of a list never clones the tree.
#[derive(Debug, Clone)]
pub struct ResolvedValue {
    /// The root of the JSON blob that contains this value.
    data_root: Arc<Value>,
    /// The path to this value inside `data_root`.
    data_path: Vec<QueryPathSegment>,
}

impl ResolvedValue {
    pub fn new(value: Value) -> Self {
        Self {
            data_root: Arc::new(value),
            data_path: Vec::new(),
        }
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub fn data_resolved(&self) -> &Value {
        self.data_path.iter().fold(self.data_root.as_ref(), |value, index| {
            match index {
                QueryPathSegment::Field(field) => value.get(field.as_str()),
                QueryPathSegment::Index(index) => value.get(*index),
            }
            .expect("data_path is validated before construction")
        })
    }

    pub fn is_null(&self) -> bool {
        self.data_resolved().is_null()
    }

    /// A new value pointing at the given index, if this is a list and the
    /// index exists.
    pub fn get_index(&self, index: usize) -> Option<ResolvedValue> {
        self.data_resolved().get(index)?;

        let mut data_path = self.data_path.clone();
        data_path.push(QueryPathSegment::Index(index));

        Some(ResolvedValue {
            data_root: Arc::clone(&self.data_root),
            data_path,
        })
    }

    /// A new value pointing at the given field, if this is an object and the
    /// field exists.
    pub fn get_field(&self, name: &str) -> Option<ResolvedValue> {
        self.data_resolved().get(name)?;

        let mut data_path = self.data_path.clone();
        data_path.push(QueryPathSegment::Field(name.to_string()));

        Some(ResolvedValue {
            data_root: Arc::clone(&self.data_root),
            data_path,
        })
    }

    /// Takes the inner value, cloning only when the root is shared.
    pub fn take(mut self) -> Value {
        match Arc::try_unwrap(self.data_root) {
            Ok(value) => self.data_path.iter().fold(value, |mut value, index| {
                match index {
                    QueryPathSegment::Field(field) => value
                        .get_mut(field.as_str())
                        .expect("data_path is validated")
                        .take(),
                    QueryPathSegment::Index(index) => {
                        value.get_mut(*index).expect("data_path is validated").take()
                    }
                }
            }),
            Err(arc) => {
                self.data_root = arc;
                self.data_resolved().clone()
            }
        }
    }

    /// If this value is a list, an iterator over its items.
    pub fn item_iter(&self) -> Option<impl Iterator<Item = ResolvedValue> + '_> {
        match self.data_resolved() {
            Value::Array(array) => Some((0..array.len()).map(|index| {
                let mut data_path = self.data_path.clone();
                data_path.push(QueryPathSegment::Index(index));

                ResolvedValue {
                    data_root: Arc::clone(&self.data_root),
                    data_path,
                }
            })),
            _ => None,
        }
    }
}

impl Default for ResolvedValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for ResolvedValue {
    fn from(value: Value) -> Self {
        ResolvedValue::new(value)
    }
}

impl From<ConstValue> for ResolvedValue {
    fn from(value: ConstValue) -> Self {
        ResolvedValue::new(value.into_json())
    }
}
