//! SPLIT() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// SPLIT() function - splits a string on a separator into a sequence of strings
pub struct SplitFunction;

impl ScalarFunction for SplitFunction {
    fn name(&self) -> &str {
        "SPLIT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "SPLIT",
                vec![
                    ParameterInfo::required("text", ValueKind::String),
                    ParameterInfo::required("separator", ValueKind::String),
                ],
                ValueKind::Sequence,
            )]
        });
        &*SIGS
    }

    fn documentation(&self) -> &str {
        "Splits the first argument at every occurrence of the separator. An empty separator is an error."
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let (Some(text), Some(separator)) = (args[0].as_str(), args[1].as_str()) else {
            return Err(FunctionError::failed("SPLIT", "expected two strings"));
        };
        if separator.is_empty() {
            return Err(FunctionError::failed("SPLIT", "separator must not be empty"));
        }
        Ok(Value::Sequence(
            text.split(separator).map(Value::from).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split() {
        let parts = SplitFunction
            .evaluate(&[Value::from("a,b,,c"), Value::from(",")])
            .unwrap();
        assert_eq!(
            parts,
            Value::from(vec![
                Value::from("a"),
                Value::from("b"),
                Value::from(""),
                Value::from("c"),
            ])
        );
    }

    #[test]
    fn test_empty_separator_fails() {
        let err = SplitFunction
            .evaluate(&[Value::from("abc"), Value::from("")])
            .unwrap_err();
        assert!(matches!(err, FunctionError::EvaluationFailed { .. }));
    }
}
