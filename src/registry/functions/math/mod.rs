//! Numeric functions

mod abs;
mod arithmetic;
mod round;

pub use abs::AbsFunction;
pub use arithmetic::{ArithmeticFunction, ArithmeticOperator};
pub(crate) use arithmetic::into_function_error;
pub use round::RoundFunction;

use crate::registry::function::FunctionRegistry;

/// Register all numeric functions
pub fn register_math_functions(registry: &mut FunctionRegistry) {
    registry.register_scalar(AbsFunction);
    for operator in ArithmeticOperator::ALL {
        registry.register_scalar(ArithmeticFunction::new(operator));
    }
    registry.register_scalar(RoundFunction);
}
