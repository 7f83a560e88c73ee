//! NotaQL transformation engine in Rust
//!
//! Evaluation core of NotaQL, a declarative language for transforming records
//! between schema-less stores. A transformation maps every input record to
//! output objects described by an argument tree, groups them by their
//! non-aggregate fields and folds aggregate functions incrementally over each
//! group.

pub mod ast;
pub mod engines;
pub mod error;
pub mod evaluator;
pub mod fixation;
pub mod model;
pub mod predicate;
pub mod registry;
pub mod transformation;

// Re-export main types
pub use ast::{Argument, FunctionCall, ObjectConstructor, PathReference, PathStep};
pub use engines::{EngineError, InputEngine, MemoryInput, MemoryOutput, OutputEngine, RecordSink, RecordSource};
pub use error::{Result, TransformationError};
pub use evaluator::{ErrorKind, EvaluationError, EvaluationResult, Evaluator, ValueEvaluationResult};
pub use fixation::{Fixation, GroupKey};
pub use model::{ObjectValue, Value, ValueKind};
pub use predicate::{ComparisonOperator, Predicate};
pub use registry::{FunctionRegistry, create_standard_registry};
pub use transformation::{RunState, RunSummary, Transformation, TransformationBuilder, TransformationConfig};
