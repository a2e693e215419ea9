//! The serialized outcome of executing one operation.

use engine_value::ConstValue;
use indexmap::IndexMap;
use serde::Serialize;

use crate::ServerError;

/// A GraphQL response. `data` is absent only for request-level failures;
/// `errors` and `extensions` are omitted when empty.
#[derive(Debug, Serialize, Default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConstValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServerError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<IndexMap<String, ConstValue>>,
}

impl Response {
    /// A response for an execution attempt that produced data (possibly
    /// null) and zero or more field errors.
    pub fn new(data: ConstValue, errors: Vec<ServerError>) -> Self {
        Self {
            data: Some(data),
            errors,
            extensions: None,
        }
    }

    /// A response for a request-level failure: no data at all.
    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Self {
            data: None,
            errors,
            extensions: None,
        }
    }

    /// Whether the execution recorded no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
