//! String functions

mod concat;
mod length;
mod lower;
mod split;
mod upper;

pub use concat::ConcatFunction;
pub use length::LengthFunction;
pub use lower::LowerFunction;
pub use split::SplitFunction;
pub use upper::UpperFunction;

use crate::registry::function::FunctionRegistry;

/// Register all string functions
pub fn register_string_functions(registry: &mut FunctionRegistry) {
    registry.register_scalar(ConcatFunction);
    registry.register_scalar(LengthFunction);
    registry.register_scalar(LowerFunction);
    registry.register_scalar(SplitFunction);
    registry.register_scalar(UpperFunction);
}
