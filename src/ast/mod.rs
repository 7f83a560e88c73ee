//! Argument tree definitions for NotaQL output specifications
//!
//! The front end (out of scope here) turns transformation text into these
//! trees; the evaluator only ever reads them.

#![warn(missing_docs)]

mod expression;
mod validate;
mod visitor;

pub use expression::*;
pub use validate::*;
pub use visitor::*;
