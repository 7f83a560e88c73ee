//! Function registry and function traits

use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::{Value, ValueKind};
use crate::registry::signature::FunctionSignature;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for function operations
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Function evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// Invalid number of arguments
    #[error("Function '{name}' expects {min}-{} arguments, got {actual}", max.map_or("∞".to_string(), |n| n.to_string()))]
    InvalidArity {
        /// Function name
        name: String,
        /// Minimum arguments
        min: usize,
        /// Maximum arguments (None for unlimited)
        max: Option<usize>,
        /// Actual arguments provided
        actual: usize,
    },

    /// Invalid argument type
    #[error("Function '{name}' argument {index} expects {expected}, got {actual}")]
    InvalidArgumentType {
        /// Function name
        name: String,
        /// Argument index
        index: usize,
        /// Expected kind
        expected: String,
        /// Actual kind
        actual: String,
    },

    /// None of the overloads accepts the argument kinds
    #[error("Function '{name}' has no overload accepting ({arguments})")]
    NoMatchingSignature {
        /// Function name
        name: String,
        /// Rendered argument kinds
        arguments: String,
    },

    /// Runtime evaluation error
    #[error("Function '{name}' evaluation error: {message}")]
    EvaluationFailed {
        /// Function name
        name: String,
        /// Error message
        message: String,
    },
}

impl FunctionError {
    /// Create a runtime evaluation error
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluationFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Check `args` against a function's overloads
pub fn check_signatures(
    name: &str,
    signatures: &[FunctionSignature],
    args: &[Value],
) -> FunctionResult<()> {
    let kinds: Vec<ValueKind> = args.iter().map(Value::kind).collect();
    if signatures.iter().any(|sig| sig.matches(&kinds)) {
        return Ok(());
    }

    let by_arity: Vec<_> = signatures
        .iter()
        .filter(|sig| sig.accepts_arity(kinds.len()))
        .collect();

    match by_arity.as_slice() {
        [] => Err(FunctionError::InvalidArity {
            name: name.to_string(),
            min: signatures.iter().map(|s| s.min_arity).min().unwrap_or(0),
            max: signatures
                .iter()
                .map(|s| s.max_arity)
                .try_fold(0, |acc, max| max.map(|m| acc.max(m))),
            actual: kinds.len(),
        }),
        [single] => {
            let index = single.first_mismatch(&kinds).unwrap_or(0);
            let expected = single
                .parameters
                .get(index)
                .or(single.parameters.last())
                .map_or(ValueKind::Any, |p| p.param_type);
            Err(FunctionError::InvalidArgumentType {
                name: name.to_string(),
                index,
                expected: expected.to_string(),
                actual: kinds[index].to_string(),
            })
        }
        _ => Err(FunctionError::NoMatchingSignature {
            name: name.to_string(),
            arguments: kinds
                .iter()
                .map(ValueKind::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Scalar function: maps argument values to one value
pub trait ScalarFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Accepted overloads
    fn signatures(&self) -> &[FunctionSignature];

    /// Evaluate the function with already validated arguments
    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value>;

    /// Get function documentation
    fn documentation(&self) -> &str {
        ""
    }

    /// Whether absent arguments are passed in as `Null` instead of failing the call
    fn absence_tolerant(&self) -> bool {
        false
    }

    /// Validate arguments before evaluation (both arity and types)
    fn validate_args(&self, args: &[Value]) -> FunctionResult<()> {
        check_signatures(self.name(), self.signatures(), args)
    }
}

/// Aggregate function: an associative, commutative combine over partial results
///
/// Partial results are plain [`Value`]s. `seed` turns the arguments evaluated
/// for one input record into a partial result, `combine` merges two partial
/// results and `finish` turns the final partial result into the output value.
/// `combine` must not depend on argument order or grouping.
pub trait AggregateFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Accepted overloads
    fn signatures(&self) -> &[FunctionSignature];

    /// Partial result contributed by one input
    fn seed(&self, args: &[Value]) -> FunctionResult<Value>;

    /// Merge two partial results
    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value>;

    /// Output value of a final partial result
    fn finish(&self, partial: &Value) -> FunctionResult<Value> {
        Ok(partial.clone())
    }

    /// Output value of a group that contributed nothing, if the function defines one
    fn empty(&self) -> Option<Value> {
        None
    }

    /// Get function documentation
    fn documentation(&self) -> &str {
        ""
    }

    /// Validate arguments before seeding
    fn validate_args(&self, args: &[Value]) -> FunctionResult<()> {
        check_signatures(self.name(), self.signatures(), args)
    }
}

/// Registry of scalar and aggregate functions, keyed case-insensitively
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    scalars: FxHashMap<String, Arc<dyn ScalarFunction>>,
    aggregates: FxHashMap<String, Arc<dyn AggregateFunction>>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("scalar_count", &self.scalars.len())
            .field("aggregate_count", &self.aggregates.len())
            .finish()
    }
}

fn registry_key(name: &str) -> String {
    name.to_ascii_uppercase()
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scalar function, replacing any previous function of that name
    pub fn register_scalar<F: ScalarFunction + 'static>(&mut self, function: F) {
        let name = registry_key(function.name());
        log::trace!("registering scalar function {name}");
        self.scalars.insert(name, Arc::new(function));
    }

    /// Register an aggregate function, replacing any previous aggregate of that name
    pub fn register_aggregate<F: AggregateFunction + 'static>(&mut self, function: F) {
        let name = registry_key(function.name());
        log::trace!("registering aggregate function {name}");
        self.aggregates.insert(name, Arc::new(function));
    }

    /// Resolve a scalar function
    pub fn scalar(&self, name: &str) -> EvaluationResult<&Arc<dyn ScalarFunction>> {
        self.scalars
            .get(&registry_key(name))
            .ok_or_else(|| EvaluationError::UndefinedFunction {
                name: name.to_string(),
            })
    }

    /// Resolve an aggregate function
    pub fn aggregate(&self, name: &str) -> EvaluationResult<&Arc<dyn AggregateFunction>> {
        self.aggregates
            .get(&registry_key(name))
            .ok_or_else(|| EvaluationError::UndefinedFunction {
                name: name.to_string(),
            })
    }

    /// Dispatch a scalar call: resolve, check signatures, evaluate
    pub fn call_scalar(&self, name: &str, args: &[Value]) -> EvaluationResult<Value> {
        let function = self.scalar(name)?;
        function.validate_args(args)?;
        Ok(function.evaluate(args)?)
    }

    /// Check whether a scalar function is registered
    pub fn has_scalar(&self, name: &str) -> bool {
        self.scalars.contains_key(&registry_key(name))
    }

    /// Check whether an aggregate function is registered
    pub fn has_aggregate(&self, name: &str) -> bool {
        self.aggregates.contains_key(&registry_key(name))
    }

    /// Registered scalar function names, sorted
    pub fn scalar_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.scalars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered aggregate function names, sorted
    pub fn aggregate_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.aggregates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ErrorKind;
    use crate::registry::signature::ParameterInfo;
    use std::sync::LazyLock;

    struct Twice;

    impl ScalarFunction for Twice {
        fn name(&self) -> &str {
            "twice"
        }

        fn signatures(&self) -> &[FunctionSignature] {
            static SIGS: LazyLock<Vec<FunctionSignature>> = LazyLock::new(|| {
                vec![
                    FunctionSignature::new(
                        "twice",
                        vec![ParameterInfo::required("n", ValueKind::Integer)],
                        ValueKind::Integer,
                    ),
                    FunctionSignature::new(
                        "twice",
                        vec![ParameterInfo::required("s", ValueKind::String)],
                        ValueKind::String,
                    ),
                ]
            });
            &SIGS
        }

        fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
            match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(n * 2)),
                Value::String(s) => Ok(Value::String(s.repeat(2))),
                _ => Err(FunctionError::failed("twice", "unreachable overload")),
            }
        }
    }

    #[test]
    fn test_dispatch_by_signature() {
        let mut registry = FunctionRegistry::new();
        registry.register_scalar(Twice);

        assert_eq!(
            registry.call_scalar("TWICE", &[Value::Integer(4)]).unwrap(),
            Value::Integer(8)
        );
        assert_eq!(
            registry.call_scalar("Twice", &[Value::from("ab")]).unwrap(),
            Value::from("abab")
        );
    }

    #[test]
    fn test_dispatch_failures() {
        let mut registry = FunctionRegistry::new();
        registry.register_scalar(Twice);

        let err = registry.call_scalar("nope", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedFunction);

        let err = registry
            .call_scalar("twice", &[Value::Boolean(true)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentTypeMismatch);
        assert!(matches!(
            err,
            EvaluationError::ArgumentTypeMismatch(FunctionError::NoMatchingSignature { .. })
        ));

        let err = registry.call_scalar("twice", &[]).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::ArgumentTypeMismatch(FunctionError::InvalidArity {
                min: 1,
                max: Some(1),
                actual: 0,
                ..
            })
        ));
    }
}
