//! TO_FLOAT() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// TO_FLOAT() function - converts strings and numbers to a float
pub struct ToFloatFunction;

impl ScalarFunction for ToFloatFunction {
    fn name(&self) -> &str {
        "TO_FLOAT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> = std::sync::LazyLock::new(|| {
            [ValueKind::String, ValueKind::Number]
                .into_iter()
                .map(|kind| {
                    FunctionSignature::new(
                        "TO_FLOAT",
                        vec![ParameterInfo::required("value", kind)],
                        ValueKind::Float,
                    )
                })
                .collect()
        });
        &SIGS
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        if let Some(f) = args[0].as_float() {
            return Ok(Value::Float(f));
        }
        match &args[0] {
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                FunctionError::failed("TO_FLOAT", format!("'{s}' is not a number"))
            }),
            other => Err(FunctionError::InvalidArgumentType {
                name: self.name().to_string(),
                index: 0,
                expected: "String or Number".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}
