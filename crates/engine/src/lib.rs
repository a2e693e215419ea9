//! A GraphQL execution engine.
//!
//! Given a built [`Schema`], a prepared executable document and the raw
//! variables of a request, [`Schema::execute`] collects fields, invokes the
//! schema's [resolvers](crate::resolvers::Resolver), completes the raw
//! values against their declared types and produces the response tree, with
//! field errors recovering at the nearest nullable ancestor.
//!
//! Parsing query text, validating documents and transporting requests are
//! the host's business; this crate consumes a ready AST and emits an
//! in-memory [`Response`].

pub mod context;
mod directive;
mod error;
mod query_path;
pub mod registry;
mod request;
pub mod resolver_utils;
pub mod resolvers;
mod response;
mod schema;

pub use engine_ast::{self as ast, Pos, Positioned};
pub use engine_value::{ConstValue, Name, Number, Value, Variables};

pub use context::{Context, ContextExt, ContextField, ContextSelectionSet, Data};
pub use error::{Error, Result, SchemaError, ServerError, ServerResult};
pub use query_path::{QueryPath, QueryPathSegment};
pub use request::{IntrospectionState, Request};
pub use response::Response;
pub use schema::{Schema, SchemaBuilder};
