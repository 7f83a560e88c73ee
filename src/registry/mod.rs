//! Function registry for NotaQL
//!
//! Functions are resolved by name and then by signature: every function
//! declares the argument kinds it accepts, and a call whose arguments match
//! none of them fails with `ArgumentTypeMismatch` instead of reaching the
//! implementation.

#![warn(missing_docs)]

pub mod function;
pub mod functions;
pub mod signature;

pub use function::{
    AggregateFunction, FunctionError, FunctionRegistry, FunctionResult, ScalarFunction,
};
pub use signature::{FunctionSignature, ParameterInfo};

use std::sync::{Arc, LazyLock};

/// Create a registry with all built-in scalar and aggregate functions
pub fn create_standard_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();

    functions::string::register_string_functions(&mut registry);
    functions::math::register_math_functions(&mut registry);
    functions::conversion::register_conversion_functions(&mut registry);
    functions::utility::register_utility_functions(&mut registry);
    functions::aggregate::register_aggregate_functions(&mut registry);

    log::debug!(
        "standard registry: {} scalar, {} aggregate functions",
        registry.scalar_names().len(),
        registry.aggregate_names().len()
    );
    registry
}

static STANDARD_REGISTRY: LazyLock<Arc<FunctionRegistry>> =
    LazyLock::new(|| Arc::new(create_standard_registry()));

impl FunctionRegistry {
    /// Shared registry with the built-in functions
    pub fn standard() -> Arc<FunctionRegistry> {
        Arc::clone(&STANDARD_REGISTRY)
    }
}
