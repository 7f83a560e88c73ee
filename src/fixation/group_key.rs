//! Grouping keys

use crate::model::Value;
use std::fmt;

/// Values of the grouping fields of one output group, in output-field order
///
/// Keys compare structurally, not with `=`: `1` and `1.0`, or `0.0` and
/// `-0.0`, are different keys and so form different groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<Value>);

impl GroupKey {
    /// Create a key from the evaluated grouping fields
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// The key values
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Number of grouping fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A transformation without grouping fields collapses everything into the empty key
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for GroupKey {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
