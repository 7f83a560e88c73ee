//! SET() aggregate - distinct values of a group

use crate::model::{Value, ValueKind};
use crate::registry::function::{AggregateFunction, FunctionResult};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// SET() aggregate - set union of the argument over the group
///
/// A sequence argument contributes its items. The result is a sequence
/// without duplicates in canonical value order.
pub struct SetFunction;

fn normalize(mut items: Vec<Value>) -> Value {
    items.sort_by(Value::canonical_cmp);
    items.dedup();
    Value::Sequence(items)
}

fn items_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Sequence(items) => items.clone(),
        other => vec![other.clone()],
    }
}

impl AggregateFunction for SetFunction {
    fn name(&self) -> &str {
        "SET"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<[FunctionSignature; 1]> = std::sync::LazyLock::new(|| {
            [FunctionSignature::new(
                "SET",
                vec![ParameterInfo::required("value", ValueKind::Any)],
                ValueKind::Sequence,
            )]
        });
        &*SIGS
    }

    fn seed(&self, args: &[Value]) -> FunctionResult<Value> {
        Ok(normalize(items_of(&args[0])))
    }

    fn combine(&self, left: &Value, right: &Value) -> FunctionResult<Value> {
        let mut items = items_of(left);
        items.extend(items_of(right));
        Ok(normalize(items))
    }

    fn empty(&self) -> Option<Value> {
        Some(Value::Sequence(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::functions::aggregate::laws::assert_combine_laws;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_union() {
        let f = SetFunction;
        let a = f
            .seed(&[Value::from(vec![Value::from("b"), Value::from("a"), Value::from("b")])])
            .unwrap();
        let b = f.seed(&[Value::from("c")]).unwrap();
        assert_eq!(
            f.combine(&a, &b).unwrap(),
            Value::from(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        );
    }

    #[test]
    fn test_set_laws() {
        assert_combine_laws(
            &SetFunction,
            &[
                vec![Value::Integer(2)],
                vec![Value::Float(2.0)],
                vec![Value::from(vec![Value::Integer(2), Value::Null])],
                vec![Value::from("x")],
            ],
        );
    }
}
