//! The executable-document tree the engine executes.
//!
//! The engine consumes a ready AST; building one from query text is the job
//! of whatever parser the host pairs with it. Everything here is plain data
//! with source positions attached through [`Positioned`].

mod pos;
pub mod types;

pub use pos::{Pos, Positioned};
