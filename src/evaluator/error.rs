// Error types for NotaQL evaluation

use crate::registry::function::FunctionError;
use std::fmt;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating arguments, predicates and transformations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Incompatible value kinds met in a comparison, navigation or arithmetic step
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected kind
        expected: String,
        /// Actual kind found
        actual: String,
    },

    /// Field or index absent from the navigated value
    #[error("Path {path} not found")]
    PathNotFound {
        /// Rendered path (or path step) that could not be resolved
        path: String,
    },

    /// Binding name not answered by the fixation
    #[error("Variable {name} is not bound")]
    UnboundVariable {
        /// Binding name
        name: String,
    },

    /// No function registered under this name
    #[error("Undefined function: {name}")]
    UndefinedFunction {
        /// Function name
        name: String,
    },

    /// The function exists but rejects the supplied argument count or kinds
    #[error("Argument type mismatch: {0}")]
    ArgumentTypeMismatch(FunctionError),

    /// The function accepted its arguments but could not produce a value
    #[error("Function '{name}' failed: {message}")]
    FunctionFailed {
        /// Function name
        name: String,
        /// Error message
        message: String,
    },

    /// The input engine produced something that is not a record
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Error message
        message: String,
    },

    /// The output engine refused a record
    #[error("Sink write failure: {message}")]
    SinkWriteFailure {
        /// Error message
        message: String,
    },

    /// The transformation, argument tree or predicate is structurally invalid
    #[error("Malformed specification: {message}")]
    MalformedSpecification {
        /// Error message
        message: String,
    },
}

/// Classification of [`EvaluationError`] without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EvaluationError::TypeMismatch`]
    TypeMismatch,
    /// See [`EvaluationError::PathNotFound`]
    PathNotFound,
    /// See [`EvaluationError::UnboundVariable`]
    UnboundVariable,
    /// See [`EvaluationError::UndefinedFunction`]
    UndefinedFunction,
    /// See [`EvaluationError::ArgumentTypeMismatch`]
    ArgumentTypeMismatch,
    /// See [`EvaluationError::FunctionFailed`]
    FunctionFailed,
    /// See [`EvaluationError::MalformedInput`]
    MalformedInput,
    /// See [`EvaluationError::SinkWriteFailure`]
    SinkWriteFailure,
    /// See [`EvaluationError::MalformedSpecification`]
    MalformedSpecification,
}

impl EvaluationError {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a path-not-found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Create an unbound-variable error
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }

    /// Create a function failure
    pub fn function_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a malformed specification error
    pub fn malformed_specification(message: impl Into<String>) -> Self {
        Self::MalformedSpecification {
            message: message.into(),
        }
    }

    /// Payload-free classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::PathNotFound { .. } => ErrorKind::PathNotFound,
            Self::UnboundVariable { .. } => ErrorKind::UnboundVariable,
            Self::UndefinedFunction { .. } => ErrorKind::UndefinedFunction,
            Self::ArgumentTypeMismatch(_) => ErrorKind::ArgumentTypeMismatch,
            Self::FunctionFailed { .. } => ErrorKind::FunctionFailed,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::SinkWriteFailure { .. } => ErrorKind::SinkWriteFailure,
            Self::MalformedSpecification { .. } => ErrorKind::MalformedSpecification,
        }
    }

    /// Whether the error means "the referenced data is not there"
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound { .. } | Self::UnboundVariable { .. }
        )
    }

    /// Whether predicates and output fields turn this error into "does not pass" / "drop"
    pub fn is_absorbable(&self) -> bool {
        self.is_absence() || matches!(self, Self::TypeMismatch { .. })
    }
}

impl From<FunctionError> for EvaluationError {
    fn from(err: FunctionError) -> Self {
        match err {
            FunctionError::EvaluationFailed { name, message } => {
                Self::FunctionFailed { name, message }
            }
            other => Self::ArgumentTypeMismatch(other),
        }
    }
}
