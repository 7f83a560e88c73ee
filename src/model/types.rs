//! Type system definitions for NotaQL values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a [`Value`](super::Value), plus the wildcards used in function signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Null scalar
    Null,
    /// Boolean scalar
    Boolean,
    /// 64-bit signed integer scalar
    Integer,
    /// 64-bit floating point scalar
    Float,
    /// UTF-8 string scalar
    String,
    /// Raw byte scalar
    Binary,
    /// UTC timestamp scalar
    Timestamp,
    /// Named-field object
    Object,
    /// Ordered sequence
    Sequence,

    /// Signature wildcard: integer or float
    Number,
    /// Signature wildcard: any scalar kind
    Scalar,
    /// Signature wildcard: anything
    Any,
}

impl ValueKind {
    /// Check whether a value of kind `actual` is accepted where `self` is expected
    pub fn is_compatible_with(&self, actual: ValueKind) -> bool {
        match (self, actual) {
            (ValueKind::Any, _) => true,
            (ValueKind::Number, ValueKind::Integer | ValueKind::Float) => true,
            (ValueKind::Scalar, kind) => kind.is_scalar(),
            (expected, actual) => *expected == actual,
        }
    }

    /// Check if this kind is a scalar kind
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueKind::Null
                | ValueKind::Boolean
                | ValueKind::Integer
                | ValueKind::Float
                | ValueKind::String
                | ValueKind::Binary
                | ValueKind::Timestamp
        )
    }

    /// Check if this kind is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }

    /// Check if this kind is one of the signature wildcards
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Scalar | ValueKind::Any)
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::Binary => "Binary",
            ValueKind::Timestamp => "Timestamp",
            ValueKind::Object => "Object",
            ValueKind::Sequence => "Sequence",
            ValueKind::Number => "Number",
            ValueKind::Scalar => "Scalar",
            ValueKind::Any => "Any",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
