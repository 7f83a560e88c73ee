//! ROUND() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// ROUND() function - rounds half away from zero, optionally to a number of decimal places
pub struct RoundFunction;

impl ScalarFunction for RoundFunction {
    fn name(&self) -> &str {
        "ROUND"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "ROUND",
                vec![
                    ParameterInfo::required("number", ValueKind::Number),
                    ParameterInfo::optional("precision", ValueKind::Integer),
                ],
                ValueKind::Number,
            )]
        });
        &*SIGS
    }

    fn documentation(&self) -> &str {
        "Rounds a number. Integers are returned unchanged; floats are rounded to `precision` decimal places (default 0)."
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let precision = match args.get(1) {
            Some(Value::Integer(p)) if (0..=15).contains(p) => *p as i32,
            Some(Value::Integer(p)) => {
                return Err(FunctionError::failed(
                    "ROUND",
                    format!("precision {p} outside 0..=15"),
                ));
            }
            _ => 0,
        };

        match &args[0] {
            Value::Integer(i) => Ok(Value::Integer(*i)),
            Value::Float(f) => {
                let factor = 10f64.powi(precision);
                Ok(Value::Float((f * factor).round() / factor))
            }
            other => Err(FunctionError::InvalidArgumentType {
                name: self.name().to_string(),
                index: 0,
                expected: ValueKind::Number.to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}
