//! IS_PRESENT() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// IS_PRESENT() function - false when the argument is absent or null
pub struct IsPresentFunction;

impl ScalarFunction for IsPresentFunction {
    fn name(&self) -> &str {
        "IS_PRESENT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "IS_PRESENT",
                vec![ParameterInfo::required("value", ValueKind::Any)],
                ValueKind::Boolean,
            )]
        });
        &*SIGS
    }

    fn absence_tolerant(&self) -> bool {
        true
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Boolean(!args[0].is_null()))
    }
}
