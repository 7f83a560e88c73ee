//! Function signatures for overload resolution

use crate::model::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Function signature for overload resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Parameter kinds
    pub parameters: Vec<ParameterInfo>,
    /// Kind of the produced value
    pub return_type: ValueKind,
    /// Minimum number of arguments
    pub min_arity: usize,
    /// Maximum number of arguments (None for variadic)
    pub max_arity: Option<usize>,
}

/// Parameter information for functions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Accepted kind
    pub param_type: ValueKind,
    /// Whether this parameter is optional
    pub optional: bool,
}

impl FunctionSignature {
    /// Create a new function signature
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<ParameterInfo>,
        return_type: ValueKind,
    ) -> Self {
        let required_params = parameters.iter().filter(|p| !p.optional).count();
        let max_arity = Some(parameters.len());

        Self {
            name: name.into(),
            parameters,
            return_type,
            min_arity: required_params,
            max_arity,
        }
    }

    /// Create a variadic function signature; extra arguments must match the last parameter
    pub fn variadic(
        name: impl Into<String>,
        parameters: Vec<ParameterInfo>,
        return_type: ValueKind,
    ) -> Self {
        let required_params = parameters.iter().filter(|p| !p.optional).count();

        Self {
            name: name.into(),
            parameters,
            return_type,
            min_arity: required_params,
            max_arity: None,
        }
    }

    /// Check if the argument count is acceptable
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_arity && self.max_arity.is_none_or(|max| count <= max)
    }

    /// Index of the first argument whose kind the signature rejects
    pub fn first_mismatch(&self, arg_types: &[ValueKind]) -> Option<usize> {
        arg_types.iter().enumerate().find_map(|(i, actual)| {
            let param = self
                .parameters
                .get(i)
                .or_else(|| self.max_arity.map_or(self.parameters.last(), |_| None));
            match param {
                Some(param) if param.param_type.is_compatible_with(*actual) => None,
                _ => Some(i),
            }
        })
    }

    /// Check if this signature matches the given argument kinds
    pub fn matches(&self, arg_types: &[ValueKind]) -> bool {
        self.accepts_arity(arg_types.len()) && self.first_mismatch(arg_types).is_none()
    }
}

impl ParameterInfo {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, param_type: ValueKind) -> Self {
        Self {
            name: name.into(),
            param_type,
            optional: false,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, param_type: ValueKind) -> Self {
        Self {
            name: name.into(),
            param_type,
            optional: true,
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.param_type)?;
            if param.optional {
                write!(f, "?")?;
            }
        }
        if self.max_arity.is_none() {
            write!(f, "...")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}
