//! SUM() aggregate

use crate::model::{Value, ValueKind};
use crate::registry::function::{AggregateFunction, FunctionError, FunctionResult};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// Running total shared by SUM and AVG
///
/// Integer totals are kept in 128 bits, so only the finished total has to fit
/// an `i64` and the outcome does not depend on the order records are added in.
/// In a partial result a total within the `i64` range is a plain integer; a
/// wider one is the pair `[high, low]` of its upper and lower 64 bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Total {
    Integer(i128),
    Float(f64),
}

impl Total {
    pub(super) fn decode(name: &str, partial: &Value) -> FunctionResult<Self> {
        match partial {
            Value::Integer(n) => Ok(Self::Integer(i128::from(*n))),
            Value::Float(f) => Ok(Self::Float(*f)),
            Value::Sequence(words) => match words.as_slice() {
                [Value::Integer(high), Value::Integer(low)] => Ok(Self::Integer(
                    (i128::from(*high) << 64) | i128::from(*low as u64),
                )),
                _ => Err(malformed(name, partial)),
            },
            _ => Err(malformed(name, partial)),
        }
    }

    pub(super) fn encode(self) -> Value {
        match self {
            Self::Integer(n) => match i64::try_from(n) {
                Ok(n) => Value::Integer(n),
                Err(_) => Value::Sequence(vec![
                    Value::Integer((n >> 64) as i64),
                    Value::Integer(n as u64 as i64),
                ]),
            },
            Self::Float(f) => Value::Float(f),
        }
    }

    pub(super) fn add(self, other: Self, name: &str) -> FunctionResult<Self> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a
                .checked_add(b)
                .map(Self::Integer)
                .ok_or_else(|| FunctionError::failed(name, "integer overflow")),
            (a, b) => Ok(Self::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub(super) fn as_f64(self) -> f64 {
        match self {
            Self::Integer(n) => n as f64,
            Self::Float(f) => f,
        }
    }

    /// Output value; an integer total outside the `i64` range is an overflow
    pub(super) fn into_value(self, name: &str) -> FunctionResult<Value> {
        match self {
            Self::Integer(n) => i64::try_from(n)
                .map(Value::Integer)
                .map_err(|_| FunctionError::failed(name, "integer overflow")),
            Self::Float(f) => Ok(Value::Float(f)),
        }
    }
}

pub(super) fn malformed(name: &str, partial: &Value) -> FunctionError {
    FunctionError::failed(name, format!("malformed partial result {partial}"))
}

/// SUM() aggregate - sum of numbers; stays an integer until a float contributes
pub struct SumFunction;

impl AggregateFunction for SumFunction {
    fn name(&self) -> &str {
        "SUM"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "SUM",
                vec![ParameterInfo::required("value", ValueKind::Number)],
                ValueKind::Number,
            )]
        });
        &*SIGS
    }

    fn documentation(&self) -> &str {
        "Adds up the argument over every record of the group. A total outside the integer range fails the run."
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(Total::decode(self.name(), &args[0])?.encode())
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        let left = Total::decode(self.name(), left)?;
        let right = Total::decode(self.name(), right)?;
        Ok(left.add(right, self.name())?.encode())
    }

    fn finish(&self, partial: &Value) -> FunctionResult<Value> {
        Total::decode(self.name(), partial)?.into_value(self.name())
    }
}
