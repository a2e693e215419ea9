//! Query context: schema-scoped and operation-scoped state, plus the borrow
//! views threaded through execution.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    ops::Deref,
    sync::{Arc, Mutex},
};

use engine_ast::{
    types::{Field, FragmentDefinition, OperationDefinition, SelectionSet},
    Pos, Positioned,
};
use engine_value::{ConstValue, Name, Variables};
use fnv::FnvHashMap;

use crate::{
    query_path::QueryPath,
    registry::{ObjectType, Registry},
    request::IntrospectionState,
    Error, ServerError, ServerResult,
};

/// Schema/context data.
///
/// This is a type map, allowing you to store anything inside it.
#[derive(Default)]
pub struct Data(FnvHashMap<TypeId, Box<dyn Any + Sync + Send>>);

impl Data {
    /// Insert data.
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    pub(crate) fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|d| d.downcast_ref::<D>())
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Data").finish()
    }
}

#[doc(hidden)]
#[derive(Debug)]
pub struct SchemaEnvInner {
    pub registry: Registry,
    pub data: Data,
}

/// Context scoped to the schema, shared by every operation executed against
/// it.
#[derive(Clone, Debug)]
pub struct SchemaEnv(Arc<SchemaEnvInner>);

impl SchemaEnv {
    pub(crate) fn new(registry: Registry, data: Data) -> Self {
        SchemaEnv(Arc::new(SchemaEnvInner { registry, data }))
    }
}

impl Deref for SchemaEnv {
    type Target = SchemaEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[doc(hidden)]
pub struct QueryEnvInner {
    /// Coerced variables, immutable for the rest of the operation.
    pub variables: Variables,
    pub operation: Positioned<OperationDefinition>,
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    pub ctx_data: Arc<Data>,
    pub errors: Mutex<Vec<ServerError>>,
    pub introspection_state: IntrospectionState,
}

/// Context scoped to one operation.
#[derive(Clone)]
pub struct QueryEnv(Arc<QueryEnvInner>);

impl QueryEnv {
    pub(crate) fn new(inner: QueryEnvInner) -> QueryEnv {
        QueryEnv(Arc::new(inner))
    }

    pub(crate) fn into_errors(self) -> Vec<ServerError> {
        match Arc::try_unwrap(self.0) {
            Ok(inner) => inner.errors.into_inner().expect("errors lock"),
            Err(arc) => arc.errors.lock().expect("errors lock").clone(),
        }
    }
}

impl Deref for QueryEnv {
    type Target = QueryEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The context while executing a selection set against an object type.
#[derive(Clone)]
pub struct ContextSelectionSet<'a> {
    /// The object type the selections apply to.
    pub ty: &'a ObjectType,
    /// The current response path.
    pub path: QueryPath,
    /// The selection set being executed.
    pub item: &'a Positioned<SelectionSet>,
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
}

impl<'a> ContextSelectionSet<'a> {
    /// The same position in the response, looking at another selection set of
    /// the same object (fragment expansion, merged sub-selections).
    pub fn with_selection_set(
        &self,
        selection_set: &'a Positioned<SelectionSet>,
    ) -> ContextSelectionSet<'a> {
        ContextSelectionSet {
            ty: self.ty,
            path: self.path.clone(),
            item: selection_set,
            schema_env: self.schema_env,
            query_env: self.query_env,
        }
    }

    /// Descend into one field of this selection set.
    pub fn with_field(&self, field: &'a Positioned<Field>) -> ContextField<'a> {
        ContextField {
            parent_type: self.ty,
            path: self.path.child(field.node.response_key().node.as_str()),
            item: field,
            schema_env: self.schema_env,
            query_env: self.query_env,
        }
    }
}

/// The context while resolving and completing one field.
#[derive(Clone)]
pub struct ContextField<'a> {
    /// The object type owning the field.
    pub parent_type: &'a ObjectType,
    /// The response path including this field's response key.
    pub path: QueryPath,
    /// The field being resolved.
    pub item: &'a Positioned<Field>,
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
}

impl<'a> ContextField<'a> {
    /// Execute a child selection set against `ty`, keeping this field's path.
    pub fn child_selection_set(
        &self,
        selection_set: &'a Positioned<SelectionSet>,
        ty: &'a ObjectType,
    ) -> ContextSelectionSet<'a> {
        ContextSelectionSet {
            ty,
            path: self.path.clone(),
            item: selection_set,
            schema_env: self.schema_env,
            query_env: self.query_env,
        }
    }
}

pub trait Context<'a> {
    fn path(&self) -> &QueryPath;
    fn query_env(&self) -> &'a QueryEnv;
    fn schema_env(&self) -> &'a SchemaEnv;

    fn registry(&self) -> &'a Registry {
        &self.schema_env().registry
    }
}

impl<'a> Context<'a> for ContextSelectionSet<'a> {
    fn path(&self) -> &QueryPath {
        &self.path
    }

    fn query_env(&self) -> &'a QueryEnv {
        self.query_env
    }

    fn schema_env(&self) -> &'a SchemaEnv {
        self.schema_env
    }
}

impl<'a> Context<'a> for ContextField<'a> {
    fn path(&self) -> &QueryPath {
        &self.path
    }

    fn query_env(&self) -> &'a QueryEnv {
        self.query_env
    }

    fn schema_env(&self) -> &'a SchemaEnv {
        self.schema_env
    }
}

/// Shared behaviour of [`ContextSelectionSet`] and [`ContextField`].
pub trait ContextExt<'a>: Context<'a> {
    /// Find a fragment definition by name.
    fn get_fragment(&self, name: &str) -> Option<&'a FragmentDefinition> {
        self.query_env().fragments.get(name).map(|fragment| &fragment.node)
    }

    /// Whether introspection fields may be served for this operation.
    fn introspection_enabled(&self) -> bool {
        match self.query_env().introspection_state {
            IntrospectionState::ForceEnabled => true,
            IntrospectionState::ForceDisabled => false,
            IntrospectionState::UserPreference => !self.registry().disable_introspection,
        }
    }

    /// Attach the current response path, unless the error already carries one.
    fn set_error_path(&self, error: ServerError) -> ServerError {
        if !error.path.is_empty() {
            return error;
        }

        ServerError {
            path: self.path().to_vec(),
            ..error
        }
    }

    /// Record an error on the response. Errors repeating an already recorded
    /// `(message, path)` pair are dropped.
    fn add_error(&self, error: ServerError) {
        let mut errors = self.query_env().errors.lock().expect("errors lock");
        if errors
            .iter()
            .any(|existing| existing.message == error.message && existing.path == error.path)
        {
            return;
        }
        errors.push(error);
    }

    /// The value of a variable: the coerced value if the operation got one,
    /// otherwise the declared default.
    fn var_value(&self, name: &str, pos: Pos) -> ServerResult<ConstValue> {
        if let Some(value) = self.query_env().variables.get(name) {
            return Ok(value.clone());
        }
        self.query_env()
            .operation
            .node
            .variable_definitions
            .iter()
            .find(|def| def.node.name.node == name)
            .and_then(|def| def.node.default_value())
            .cloned()
            .ok_or_else(|| ServerError::new(format!("Variable {name} is not defined."), Some(pos)))
    }

    /// Gets the global data defined in the `Context` or `Schema`.
    ///
    /// If both have the same data type, the operation-scoped one wins.
    fn data<D: Any + Send + Sync>(&self) -> Result<&'a D, Error> {
        self.data_opt::<D>()
            .ok_or_else(|| Error::new(format!("Data `{}` does not exist.", std::any::type_name::<D>())))
    }

    /// Gets the global data defined in the `Context` or `Schema`, or `None`
    /// if it does not exist.
    fn data_opt<D: Any + Send + Sync>(&self) -> Option<&'a D> {
        self.query_env()
            .ctx_data
            .get::<D>()
            .or_else(|| self.schema_env().data.get::<D>())
    }
}

impl<'a, T> ContextExt<'a> for T where T: Context<'a> + ?Sized {}
