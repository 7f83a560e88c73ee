//! Built-in function implementations

pub mod aggregate;
pub mod conversion;
pub mod math;
pub mod string;
pub mod utility;

pub use aggregate::*;
pub use conversion::*;
pub use math::*;
pub use string::*;
pub use utility::*;
