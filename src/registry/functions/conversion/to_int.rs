//! TO_INT() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// TO_INT() function - converts strings, numbers and booleans to an integer
pub struct ToIntFunction;

impl ScalarFunction for ToIntFunction {
    fn name(&self) -> &str {
        "TO_INT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> = std::sync::LazyLock::new(|| {
            [ValueKind::String, ValueKind::Number, ValueKind::Boolean]
                .into_iter()
                .map(|kind| {
                    FunctionSignature::new(
                        "TO_INT",
                        vec![ParameterInfo::required("value", kind)],
                        ValueKind::Integer,
                    )
                })
                .collect()
        });
        &SIGS
    }

    fn documentation(&self) -> &str {
        "Converts to an integer. Floats are truncated toward zero; strings must hold a decimal integer."
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        match &args[0] {
            Value::Integer(i) => Ok(Value::Integer(*i)),
            Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
            Value::Float(f) => {
                let truncated = f.trunc();
                if truncated.is_finite()
                    && truncated >= i64::MIN as f64
                    && truncated < i64::MAX as f64
                {
                    Ok(Value::Integer(truncated as i64))
                } else {
                    Err(FunctionError::failed(
                        "TO_INT",
                        format!("{f} is outside the integer range"),
                    ))
                }
            }
            Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
                FunctionError::failed("TO_INT", format!("'{s}' is not an integer"))
            }),
            other => Err(FunctionError::InvalidArgumentType {
                name: self.name().to_string(),
                index: 0,
                expected: "String, Number or Boolean".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}
