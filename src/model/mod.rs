//! Data model and value types for NotaQL transformations
//!
//! This module provides the schema-less value model that every engine decodes
//! records into and that the evaluator, predicates and fixations operate on.

#![warn(missing_docs)]

pub mod types;
pub mod value;

pub use types::ValueKind;
pub use value::{ObjectValue, Value};
