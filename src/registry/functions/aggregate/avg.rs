//! AVG() aggregate

use super::sum::{Total, malformed};
use crate::model::{Value, ValueKind};
use crate::registry::function::{AggregateFunction, FunctionError, FunctionResult};
use crate::registry::functions::math::into_function_error;
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// AVG() aggregate - arithmetic mean as a float
///
/// The partial result is the pair `[total, count]`, the total kept the way
/// SUM keeps it.
pub struct AvgFunction;

impl AvgFunction {
    fn unpack<'a>(&self, partial: &'a Value) -> FunctionResult<(Total, &'a Value)> {
        match partial.as_sequence() {
            Some([total, count]) => Ok((Total::decode(self.name(), total)?, count)),
            _ => Err(malformed(self.name(), partial)),
        }
    }
}

impl AggregateFunction for AvgFunction {
    fn name(&self) -> &str {
        "AVG"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "AVG",
                vec![ParameterInfo::required("value", ValueKind::Number)],
                ValueKind::Float,
            )]
        });
        &*SIGS
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        let total = Total::decode(self.name(), &args[0])?;
        Ok(Value::Sequence(vec![total.encode(), Value::Integer(1)]))
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        let (left_total, left_count) = self.unpack(left)?;
        let (right_total, right_count) = self.unpack(right)?;
        let count = left_count
            .checked_add(right_count)
            .map_err(|err| into_function_error(self.name(), err))?;
        Ok(Value::Sequence(vec![
            left_total.add(right_total, self.name())?.encode(),
            count,
        ]))
    }

    fn finish(&self, partial: &Value) -> FunctionResult<Value> {
        let (total, count) = self.unpack(partial)?;
        match count.as_float() {
            Some(count) if count > 0.0 => Ok(Value::Float(total.as_f64() / count)),
            _ => Err(FunctionError::failed(
                self.name(),
                format!("malformed partial result {partial}"),
            )),
        }
    }
}
