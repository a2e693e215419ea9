use std::fmt::{self, Debug, Display, Formatter};

use serde::Serialize;
use thiserror::Error as ThisError;

use crate::{query_path::QueryPathSegment, Pos};

/// Alias for `Result<T, ServerError>`.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// An alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised inside a resolver or during coercion, before it is
/// attached to a position and a response path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The error message.
    pub message: String,
}

impl Error {
    /// Create an error from the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Convert the error to a server error.
    #[must_use]
    pub fn into_server_error(self, pos: Pos) -> ServerError {
        ServerError::new(self.message, Some(pos))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// An error recorded on the response, with the locations and response path
/// of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerError {
    /// The error message.
    pub message: String,
    /// Where the error occurred in the document.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Pos>,
    /// The response path of the field that errored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<QueryPathSegment>,
}

impl ServerError {
    /// Create a new server error with the message.
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> Self {
        Self {
            message: message.into(),
            locations: pos.into_iter().collect(),
            path: Vec::new(),
        }
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ServerError> for Error {
    fn from(value: ServerError) -> Self {
        Self {
            message: value.message,
        }
    }
}

/// An error encountered while building or validating a schema.
#[derive(Debug, ThisError)]
pub enum SchemaError {
    /// A type was referenced but never registered.
    #[error("Unknown type `{name}` referenced from `{referenced_by}`")]
    UnknownType { name: String, referenced_by: String },

    /// An output position names a type only usable as input.
    #[error("`{name}` is not an output type but is used as the type of `{referenced_by}`")]
    NotOutputType { name: String, referenced_by: String },

    /// An input position names a type only usable as output.
    #[error("`{name}` is not an input type but is used as the type of `{referenced_by}`")]
    NotInputType { name: String, referenced_by: String },

    /// A union member is not an object type.
    #[error("Union `{union_name}` member `{member}` is not an object type")]
    NonObjectUnionMember { union_name: String, member: String },

    /// An object declares it implements something that is not an interface.
    #[error("`{object}` implements `{interface}`, which is not an interface type")]
    NotAnInterface { object: String, interface: String },

    /// A root operation type is missing or is not an object.
    #[error("Root operation type `{0}` must be a registered object type")]
    InvalidRootType(String),
}

/// Type-name context threaded through [`crate::registry::Registry`]
/// validation so `SchemaError`s can say where a reference came from.
pub(crate) fn referenced_by(type_name: &str, field: &str) -> String {
    format!("{type_name}.{field}")
}
