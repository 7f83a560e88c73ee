//! Utility functions for optional data

mod coalesce;
mod is_present;

pub use coalesce::CoalesceFunction;
pub use is_present::IsPresentFunction;

use crate::registry::function::FunctionRegistry;

/// Register all utility functions
pub fn register_utility_functions(registry: &mut FunctionRegistry) {
    registry.register_scalar(CoalesceFunction);
    registry.register_scalar(IsPresentFunction);
}
