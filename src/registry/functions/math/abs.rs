//! ABS() function - absolute value

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// ABS() function - absolute value
pub struct AbsFunction;

impl ScalarFunction for AbsFunction {
    fn name(&self) -> &str {
        "ABS"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "ABS",
                vec![ParameterInfo::required("number", ValueKind::Number)],
                ValueKind::Number,
            )]
        });
        &*SIGS
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        match &args[0] {
            Value::Integer(i) => i
                .checked_abs()
                .map(Value::Integer)
                .ok_or_else(|| FunctionError::failed("ABS", "integer overflow")),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(FunctionError::InvalidArgumentType {
                name: self.name().to_string(),
                index: 0,
                expected: ValueKind::Number.to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}
