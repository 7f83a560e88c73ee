//! TO_STRING() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// TO_STRING() function - renders a scalar the way engines encode it
pub struct ToStringFunction;

impl ScalarFunction for ToStringFunction {
    fn name(&self) -> &str {
        "TO_STRING"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "TO_STRING",
                vec![ParameterInfo::required("value", ValueKind::Scalar)],
                ValueKind::String,
            )]
        });
        &*SIGS
    }

    fn documentation(&self) -> &str {
        "Converts a scalar to its textual form: strings unchanged, binaries as base64, timestamps as RFC 3339, everything else as JSON."
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let text = match args[0].to_json() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[rstest]
    #[case(Value::from("plain"), "plain")]
    #[case(Value::Integer(42), "42")]
    #[case(Value::Float(2.5), "2.5")]
    #[case(Value::Boolean(false), "false")]
    #[case(Value::Null, "null")]
    #[case(Value::from(vec![0u8, 255]), "AP8=")]
    #[case(
        Value::from(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        "2024-01-02T03:04:05Z"
    )]
    fn test_to_string(#[case] input: Value, #[case] expected: &str) {
        assert_eq!(
            ToStringFunction.evaluate(&[input]).unwrap(),
            Value::from(expected)
        );
    }

    #[test]
    fn test_rejects_structures() {
        assert!(
            ToStringFunction
                .validate_args(&[Value::from(vec![Value::Null])])
                .is_err()
        );
    }
}
