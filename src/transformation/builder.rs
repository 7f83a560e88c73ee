//! Fluent construction of transformations

use super::{Transformation, TransformationConfig};
use crate::ast::{Argument, ObjectConstructor};
use crate::engines::{InputEngine, OutputEngine};
use crate::evaluator::EvaluationResult;
use crate::predicate::Predicate;
use crate::registry::FunctionRegistry;
use std::sync::Arc;

/// Builder for [`Transformation`]
///
/// ```
/// use notaql::{Argument, MemoryInput, MemoryOutput, Transformation};
///
/// let transformation = Transformation::builder(MemoryInput::new([]), MemoryOutput::new())
///     .field("b", Argument::field("IN.b"))
///     .field("total", Argument::aggregate("SUM", vec![Argument::field("IN.a")]))
///     .build()
///     .unwrap();
/// assert_eq!(transformation.grouping_fields(), vec!["b"]);
/// ```
#[must_use]
pub struct TransformationBuilder {
    in_engine: Arc<dyn InputEngine>,
    out_engine: Arc<dyn OutputEngine>,
    in_predicate: Option<Predicate>,
    out_predicate: Option<Predicate>,
    output: ObjectConstructor,
    registry: Option<Arc<FunctionRegistry>>,
    config: TransformationConfig,
}

impl TransformationBuilder {
    /// Start from two engines and an empty output specification
    pub fn new(in_engine: Arc<dyn InputEngine>, out_engine: Arc<dyn OutputEngine>) -> Self {
        Self {
            in_engine,
            out_engine,
            in_predicate: None,
            out_predicate: None,
            output: ObjectConstructor::new(),
            registry: None,
            config: TransformationConfig::default(),
        }
    }

    /// Append an output field
    pub fn field(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.output.push(name, argument);
        self
    }

    /// Replace the whole output specification
    pub fn output(mut self, output: ObjectConstructor) -> Self {
        self.output = output;
        self
    }

    /// Filter input records
    pub fn in_predicate(mut self, predicate: Predicate) -> Self {
        self.in_predicate = Some(predicate);
        self
    }

    /// Filter output objects
    pub fn out_predicate(mut self, predicate: Predicate) -> Self {
        self.out_predicate = Some(predicate);
        self
    }

    /// Resolve functions from a custom registry
    pub fn registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run configuration
    pub fn config(mut self, config: TransformationConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and build the transformation
    ///
    /// Fails with `MalformedSpecification` for an empty or too deep output
    /// specification, aggregates inside predicates or aggregate fields that
    /// read input paths outside their aggregate calls, and with
    /// `UndefinedFunction` for unknown aggregates.
    pub fn build(self) -> EvaluationResult<Transformation> {
        Transformation::assemble(
            self.in_engine,
            self.out_engine,
            self.in_predicate,
            self.out_predicate,
            self.output,
            self.registry.unwrap_or_else(FunctionRegistry::standard),
            self.config,
        )
    }
}
