//! ADD(), SUB(), MUL() and DIV() functions

use crate::evaluator::EvaluationError;
use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division; integer division truncates toward zero
    Div,
}

impl ArithmeticOperator {
    /// Every operator, in registration order
    pub const ALL: [ArithmeticOperator; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    /// Function name the operator is registered under
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
        }
    }
}

/// Arithmetic over two numbers; integers stay integers, anything involving a float widens
pub struct ArithmeticFunction {
    operator: ArithmeticOperator,
    signatures: [FunctionSignature; 1],
}

impl ArithmeticFunction {
    /// Create the function for one operator
    pub fn new(operator: ArithmeticOperator) -> Self {
        Self {
            operator,
            signatures: [FunctionSignature::new(
                operator.name(),
                vec![
                    ParameterInfo::required("left", ValueKind::Number),
                    ParameterInfo::required("right", ValueKind::Number),
                ],
                ValueKind::Number,
            )],
        }
    }
}

impl ScalarFunction for ArithmeticFunction {
    fn name(&self) -> &str {
        self.operator.name()
    }

    fn signatures(&self) -> &[FunctionSignature] {
        &self.signatures
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        let (left, right) = (&args[0], &args[1]);
        let result = match self.operator {
            ArithmeticOperator::Add => left.checked_add(right),
            ArithmeticOperator::Sub => left.checked_sub(right),
            ArithmeticOperator::Mul => left.checked_mul(right),
            ArithmeticOperator::Div => left.checked_div(right),
        };
        result.map_err(|err| into_function_error(self.name(), err))
    }
}

/// Report a value-level arithmetic failure as a failure of the named function
pub(crate) fn into_function_error(name: &str, err: EvaluationError) -> FunctionError {
    match err {
        EvaluationError::FunctionFailed { message, .. } => FunctionError::failed(name, message),
        other => FunctionError::failed(name, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ArithmeticOperator::Add, Value::Integer(2), Value::Integer(3), Value::Integer(5))]
    #[case(ArithmeticOperator::Sub, Value::Integer(2), Value::Float(0.5), Value::Float(1.5))]
    #[case(ArithmeticOperator::Mul, Value::Float(1.5), Value::Integer(2), Value::Float(3.0))]
    #[case(ArithmeticOperator::Div, Value::Integer(7), Value::Integer(2), Value::Integer(3))]
    #[case(ArithmeticOperator::Div, Value::Integer(-7), Value::Integer(2), Value::Integer(-3))]
    fn test_arithmetic(
        #[case] operator: ArithmeticOperator,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        let f = ArithmeticFunction::new(operator);
        assert_eq!(f.evaluate(&[left, right]).unwrap(), expected);
    }

    #[test]
    fn test_failures_name_the_function() {
        let div = ArithmeticFunction::new(ArithmeticOperator::Div);
        let err = div
            .evaluate(&[Value::Integer(1), Value::Integer(0)])
            .unwrap_err();
        assert_eq!(err, FunctionError::failed("DIV", "division by zero"));

        let add = ArithmeticFunction::new(ArithmeticOperator::Add);
        let err = add
            .evaluate(&[Value::Integer(i64::MAX), Value::Integer(1)])
            .unwrap_err();
        assert_eq!(err, FunctionError::failed("ADD", "integer overflow"));

        assert!(add.validate_args(&[Value::from("1"), Value::Integer(1)]).is_err());
    }
}
