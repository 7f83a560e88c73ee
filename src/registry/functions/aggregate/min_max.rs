//! MIN() and MAX() aggregates

use crate::model::{Value, ValueKind};
use crate::registry::function::{AggregateFunction, FunctionResult};
use crate::registry::functions::math::into_function_error;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use std::cmp::Ordering;

fn orderable_signatures(name: &str) -> Vec<FunctionSignature> {
    [
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Timestamp,
        ValueKind::Binary,
    ]
    .into_iter()
    .map(|kind| {
        FunctionSignature::new(
            name,
            vec![ParameterInfo::required("value", kind)],
            kind,
        )
    })
    .collect()
}

/// Pick the extreme of two values; values the comparison calls equal
/// (such as `1` and `1.0`) are resolved by the canonical order
fn pick(name: &str, left: &Value, right: &Value, keep: Ordering) -> FunctionResult<Value> {
    let ordering = match left.compare(right) {
        Ok(ordering) => ordering.then_with(|| left.canonical_cmp(right)),
        // NaN is unordered numerically
        Err(_) if left.kind().is_numeric() && right.kind().is_numeric() => {
            left.canonical_cmp(right)
        }
        Err(err) => return Err(into_function_error(name, err)),
    };
    Ok(if ordering == keep || ordering == Ordering::Equal {
        left.clone()
    } else {
        right.clone()
    })
}

/// MIN() aggregate - smallest number, string, timestamp or binary
pub struct MinFunction;

impl AggregateFunction for MinFunction {
    fn name(&self) -> &str {
        "MIN"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> =
            std::sync::LazyLock::new(|| orderable_signatures("MIN"));
        &SIGS
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(args[0].clone())
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        pick(self.name(), left, right, Ordering::Less)
    }
}

/// MAX() aggregate - largest number, string, timestamp or binary
pub struct MaxFunction;

impl AggregateFunction for MaxFunction {
    fn name(&self) -> &str {
        "MAX"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> =
            std::sync::LazyLock::new(|| orderable_signatures("MAX"));
        &SIGS
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(args[0].clone())
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        pick(self.name(), left, right, Ordering::Greater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::functions::aggregate::laws::assert_combine_laws;

    #[test]
    fn test_min_max() {
        assert_eq!(
            MinFunction
                .combine(&Value::Integer(3), &Value::Float(2.5))
                .unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            MaxFunction
                .combine(&Value::from("apple"), &Value::from("pear"))
                .unwrap(),
            Value::from("pear")
        );
    }

    #[test]
    fn test_mixed_kinds_fail() {
        assert!(
            MinFunction
                .combine(&Value::Integer(1), &Value::from("1"))
                .is_err()
        );
    }

    #[test]
    fn test_signed_zeros_resolve_canonically() {
        let (negative, positive) = (Value::Float(-0.0), Value::Float(0.0));
        assert_eq!(MinFunction.combine(&positive, &negative).unwrap(), negative);
        assert_eq!(MaxFunction.combine(&negative, &positive).unwrap(), positive);
    }

    #[test]
    fn test_min_max_laws() {
        let inputs = [
            vec![Value::Integer(1)],
            vec![Value::Float(1.0)],
            vec![Value::Integer(-4)],
            vec![Value::Float(8.5)],
            vec![Value::Float(0.0)],
            vec![Value::Float(-0.0)],
            vec![Value::Float(f64::NAN)],
        ];
        assert_combine_laws(&MinFunction, &inputs);
        assert_combine_laws(&MaxFunction, &inputs);
    }
}
