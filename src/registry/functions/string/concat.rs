//! CONCAT() function - string concatenation

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// CONCAT() function - joins its string arguments
pub struct ConcatFunction;

impl ScalarFunction for ConcatFunction {
    fn name(&self) -> &str {
        "CONCAT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::variadic(
                "CONCAT",
                vec![ParameterInfo::optional("part", ValueKind::String)],
                ValueKind::String,
            )]
        });
        &*SIGS
    }

    fn documentation(&self) -> &str {
        "Concatenates all string arguments in order. Without arguments the result is the empty string."
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let joined: String = args.iter().filter_map(Value::as_str).collect();
        Ok(Value::String(joined))
    }
}
