//! LOWER() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// LOWER() function - lower-cases a string
pub struct LowerFunction;

impl ScalarFunction for LowerFunction {
    fn name(&self) -> &str {
        "LOWER"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "LOWER",
                vec![ParameterInfo::required("text", ValueKind::String)],
                ValueKind::String,
            )]
        });
        &*SIGS
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(Value::String(
            args[0].as_str().unwrap_or_default().to_lowercase(),
        ))
    }
}
