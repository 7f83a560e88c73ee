//! LENGTH() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// LENGTH() function - character count of a string, element count of a
/// sequence or object, byte count of a binary
pub struct LengthFunction;

impl ScalarFunction for LengthFunction {
    fn name(&self) -> &str {
        "LENGTH"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> = std::sync::LazyLock::new(|| {
            [
                ValueKind::String,
                ValueKind::Sequence,
                ValueKind::Object,
                ValueKind::Binary,
            ]
            .into_iter()
            .map(|kind| {
                FunctionSignature::new(
                    "LENGTH",
                    vec![ParameterInfo::required("value", kind)],
                    ValueKind::Integer,
                )
            })
            .collect()
        });
        &SIGS
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let len = match &args[0] {
            Value::String(s) => s.chars().count(),
            Value::Sequence(items) => items.len(),
            Value::Object(fields) => fields.len(),
            Value::Binary(bytes) => bytes.len(),
            other => {
                return Err(FunctionError::InvalidArgumentType {
                    name: self.name().to_string(),
                    index: 0,
                    expected: "String, Sequence, Object or Binary".to_string(),
                    actual: other.kind().to_string(),
                });
            }
        };
        i64::try_from(len)
            .map(Value::Integer)
            .map_err(|_| FunctionError::failed("LENGTH", "length exceeds integer range"))
    }
}
