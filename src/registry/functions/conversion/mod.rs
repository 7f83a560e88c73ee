//! Conversion functions between scalar kinds

mod timestamp;
mod to_float;
mod to_int;
mod to_string;

pub use timestamp::TimestampFunction;
pub use to_float::ToFloatFunction;
pub use to_int::ToIntFunction;
pub use to_string::ToStringFunction;

use crate::registry::function::FunctionRegistry;

/// Register all conversion functions
pub fn register_conversion_functions(registry: &mut FunctionRegistry) {
    registry.register_scalar(TimestampFunction);
    registry.register_scalar(ToFloatFunction);
    registry.register_scalar(ToIntFunction);
    registry.register_scalar(ToStringFunction);
}
