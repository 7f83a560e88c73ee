//! COUNT() aggregate

use crate::model::{Value, ValueKind};
use crate::registry::function::{AggregateFunction, FunctionResult};
use crate::registry::functions::math::into_function_error;
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// COUNT() aggregate - number of records in the group, or with an argument,
/// number of records where the argument is present and not null
pub struct CountFunction;

impl AggregateFunction for CountFunction {
    fn name(&self) -> &str {
        "COUNT"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "COUNT",
                vec![ParameterInfo::optional("value", ValueKind::Any)],
                ValueKind::Integer,
            )]
        });
        &*SIGS
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        let counted = args.first().is_none_or(|value| !value.is_null());
        Ok(Value::Integer(i64::from(counted)))
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        left.checked_add(right)
            .map_err(|err| into_function_error(self.name(), err))
    }

    fn empty(&self) -> Option<Value> {
        Some(Value::Integer(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::functions::aggregate::laws::assert_combine_laws;

    #[test]
    fn test_count_skips_nulls() {
        let f = CountFunction;
        assert_eq!(f.seed(&[]).unwrap(), Value::Integer(1));
        assert_eq!(f.seed(&[Value::Null]).unwrap(), Value::Integer(0));
        assert_eq!(f.seed(&[Value::from("x")]).unwrap(), Value::Integer(1));
        assert_eq!(f.empty(), Some(Value::Integer(0)));
    }

    #[test]
    fn test_count_laws() {
        assert_combine_laws(
            &CountFunction,
            &[vec![], vec![Value::Null], vec![Value::Integer(9)]],
        );
    }
}
