//! Run-level errors
//!
//! A failed run reports the evaluation error together with where it happened:
//! the orchestrator state, the output field or predicate being evaluated, and
//! the input record or output object at hand.

use crate::evaluator::{ErrorKind, EvaluationError};
use crate::model::Value;
use crate::transformation::RunState;
use thiserror::Error;

/// Result type for transformation runs
pub type Result<T> = std::result::Result<T, TransformationError>;

/// Fatal failure of a transformation run
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source} (while {state}){}{}",
    .argument.as_ref().map(|a| format!(" in {a}")).unwrap_or_default(),
    .record.as_ref().map(|r| format!(" on record {r}")).unwrap_or_default()
)]
pub struct TransformationError {
    /// Underlying evaluation error
    pub source: EvaluationError,
    /// State the run was in
    pub state: RunState,
    /// Rendered argument or predicate being evaluated
    pub argument: Option<String>,
    /// Input record or output object being processed
    pub record: Option<Value>,
}

impl TransformationError {
    /// Wrap an error raised in `state`
    pub fn new(source: EvaluationError, state: RunState) -> Self {
        Self {
            source,
            state,
            argument: None,
            record: None,
        }
    }

    /// Attach the offending argument or predicate
    pub fn with_argument(mut self, argument: impl ToString) -> Self {
        self.argument = Some(argument.to_string());
        self
    }

    /// Attach the offending record
    pub fn with_record(mut self, record: &Value) -> Self {
        self.record = Some(record.clone());
        self
    }

    /// Classification of the underlying error
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl From<EvaluationError> for TransformationError {
    fn from(source: EvaluationError) -> Self {
        Self::new(source, RunState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_carries_context() {
        let err = TransformationError::new(
            EvaluationError::UndefinedFunction {
                name: "FOO".to_string(),
            },
            RunState::Emitting,
        )
        .with_argument("x <- FOO(IN.a)")
        .with_record(&Value::from(json!({"a": 1})));

        assert_eq!(
            err.to_string(),
            r#"Undefined function: FOO (while emitting) in x <- FOO(IN.a) on record {"a":1}"#
        );
        assert_eq!(err.kind(), ErrorKind::UndefinedFunction);
    }
}
