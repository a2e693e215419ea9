//! The per-operation input handed to [`crate::Schema::execute`].

use std::fmt::{self, Debug, Formatter};

use engine_value::Variables;
use serde::{Deserialize, Serialize};

use crate::context::Data;

/// Whether introspection fields are served for a request.
#[derive(Serialize, Deserialize, Default, PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[serde(rename_all = "camelCase")]
pub enum IntrospectionState {
    ForceEnabled,
    ForceDisabled,
    /// Follow the schema's own setting.
    #[default]
    UserPreference,
}

/// One execution request: which operation of the document to run, with which
/// variables, and the host context resolvers see.
///
/// Deserializes from the usual wire shape (`operationName`, `variables`).
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The operation to select when the document has several.
    #[serde(default)]
    pub operation_name: Option<String>,

    /// The raw variables of the request.
    #[serde(default)]
    pub variables: Variables,

    /// Force enable or disable introspection for this request.
    #[serde(skip)]
    pub introspection_state: IntrospectionState,

    /// Host data resolvers can reach through the resolver context.
    ///
    /// **This data is only valid for this request.**
    #[serde(skip)]
    pub data: Data,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the operation name of the request.
    #[must_use]
    pub fn with_operation_name<T: Into<String>>(self, name: T) -> Self {
        Self {
            operation_name: Some(name.into()),
            ..self
        }
    }

    /// Specify the variables.
    #[must_use]
    pub fn with_variables(self, variables: Variables) -> Self {
        Self { variables, ..self }
    }

    /// Insert data accessible from every resolver of this request.
    #[must_use]
    pub fn with_data<D: std::any::Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    #[must_use]
    pub fn with_introspection_state(self, introspection_state: IntrospectionState) -> Self {
        Self {
            introspection_state,
            ..self
        }
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("introspection_state", &self.introspection_state)
            .finish_non_exhaustive()
    }
}
