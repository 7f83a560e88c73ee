//! COALESCE() function - first present value

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// COALESCE() function
///
/// Returns the first argument that is neither absent nor null, or null when
/// there is none. This is how an author makes an output field optional:
/// `COALESCE(IN.nickname, IN.name)` keeps the object even when `nickname`
/// is missing from the record.
pub struct CoalesceFunction;

impl ScalarFunction for CoalesceFunction {
    fn name(&self) -> &str {
        "COALESCE"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::variadic(
                "COALESCE",
                vec![ParameterInfo::required("candidate", ValueKind::Any)],
                ValueKind::Any,
            )]
        });
        &*SIGS
    }

    fn absence_tolerant(&self) -> bool {
        true
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(args
            .iter()
            .find(|value| !value.is_null())
            .cloned()
            .unwrap_or(Value::Null))
    }
}
