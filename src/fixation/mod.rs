//! Variable fixations
//!
//! A [`Fixation`] is the immutable binding environment an argument tree is
//! evaluated under. It is built from one input record and, during aggregation,
//! merged with the fixations of every other record that lands in the same
//! output group. Fixations are reference counted and never mutated, so they can
//! be shared freely between threads.

mod group_key;

pub use group_key::GroupKey;

use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::Value;
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Binding name of the input record itself
pub const INPUT_BINDING: &str = "IN";

/// Binding name of the produced output object (visible to output predicates)
pub const OUTPUT_BINDING: &str = "OUT";

/// Binding name of the candidate value under predicate evaluation
pub const CURRENT_BINDING: &str = "@";

static EMPTY: LazyLock<Fixation> = LazyLock::new(|| Fixation(Arc::new(FixationNode::Empty)));

/// Immutable, chainable binding environment
#[derive(Clone)]
pub struct Fixation(Arc<FixationNode>);

enum FixationNode {
    Empty,
    /// Binds `self_name` to the record and, lazily, every top-level field of an object record
    Record {
        self_name: &'static str,
        record: Value,
    },
    /// Two fixations sharing a grouping key; `left` answers first
    Grouped {
        left: Fixation,
        right: Fixation,
        key: GroupKey,
    },
    /// `head` answers first, `tail` answers what `head` cannot
    Chained { head: Fixation, tail: Fixation },
    Binding {
        name: String,
        value: Value,
        parent: Fixation,
    },
}

impl Fixation {
    /// Fixation that binds nothing
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// Build the fixation of one input record
    pub fn from_record(record: Value) -> Self {
        Self(Arc::new(FixationNode::Record {
            self_name: INPUT_BINDING,
            record,
        }))
    }

    /// Build the fixation of a produced output object
    pub fn from_output(output: Value) -> Self {
        Self(Arc::new(FixationNode::Record {
            self_name: OUTPUT_BINDING,
            record: output,
        }))
    }

    /// Resolve a binding name
    pub fn lookup(&self, name: &str) -> EvaluationResult<&Value> {
        let mut pending: SmallVec<[&FixationNode; 8]> = smallvec![&*self.0];

        while let Some(node) = pending.pop() {
            match node {
                FixationNode::Empty => {}
                FixationNode::Record { self_name, record } => {
                    if name == *self_name {
                        return Ok(record);
                    }
                    if let Value::Object(fields) = record {
                        if let Some(value) = fields.get(name) {
                            return Ok(value);
                        }
                    }
                }
                FixationNode::Grouped { left, right, .. }
                | FixationNode::Chained {
                    head: left,
                    tail: right,
                } => {
                    pending.push(&right.0);
                    pending.push(&left.0);
                }
                FixationNode::Binding {
                    name: bound,
                    value,
                    parent,
                } => {
                    if bound == name {
                        return Ok(value);
                    }
                    pending.push(&parent.0);
                }
            }
        }

        Err(EvaluationError::unbound_variable(name))
    }

    /// Merge two fixations of the same output group
    ///
    /// The caller guarantees that both sides evaluated to `key`. Names bound on
    /// both sides resolve to this fixation's value.
    pub fn merge(&self, other: &Fixation, key: &GroupKey) -> Fixation {
        Self(Arc::new(FixationNode::Grouped {
            left: self.clone(),
            right: other.clone(),
            key: key.clone(),
        }))
    }

    /// Consult `self` first and fall back to `tail`
    pub fn chain(&self, tail: &Fixation) -> Fixation {
        Self(Arc::new(FixationNode::Chained {
            head: self.clone(),
            tail: tail.clone(),
        }))
    }

    /// Bind one extra name on top of this fixation
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Fixation {
        Self(Arc::new(FixationNode::Binding {
            name: name.into(),
            value,
            parent: self.clone(),
        }))
    }

    /// Grouping key this fixation was merged under, if it is a grouped fixation
    pub fn group_key(&self) -> Option<&GroupKey> {
        match &*self.0 {
            FixationNode::Grouped { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Every record this fixation was built from, in merge order
    pub fn records(&self) -> Vec<&Value> {
        let mut records = Vec::new();
        let mut pending: Vec<&FixationNode> = vec![&*self.0];

        while let Some(node) = pending.pop() {
            match node {
                FixationNode::Empty => {}
                FixationNode::Record { record, .. } => records.push(record),
                FixationNode::Grouped { left, right, .. }
                | FixationNode::Chained {
                    head: left,
                    tail: right,
                } => {
                    pending.push(&right.0);
                    pending.push(&left.0);
                }
                FixationNode::Binding { parent, .. } => pending.push(&parent.0),
            }
        }

        records
    }

    /// Number of records this fixation was built from
    pub fn record_count(&self) -> usize {
        self.records().len()
    }
}

impl FixationNode {
    fn take_children(&mut self, out: &mut Vec<Fixation>) {
        match self {
            FixationNode::Empty | FixationNode::Record { .. } => {}
            FixationNode::Grouped { left, right, .. }
            | FixationNode::Chained {
                head: left,
                tail: right,
            } => {
                out.push(std::mem::replace(left, Fixation::empty()));
                out.push(std::mem::replace(right, Fixation::empty()));
            }
            FixationNode::Binding { parent, .. } => {
                out.push(std::mem::replace(parent, Fixation::empty()));
            }
        }
    }
}

// Grouped fixations form chains as long as the group; unlink them iteratively.
impl Drop for FixationNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child.0) {
                node.take_children(&mut pending);
            }
        }
    }
}

impl fmt::Debug for Fixation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0 {
            FixationNode::Empty => "empty",
            FixationNode::Record { .. } => "record",
            FixationNode::Grouped { .. } => "grouped",
            FixationNode::Chained { .. } => "chained",
            FixationNode::Binding { .. } => "binding",
        };
        f.debug_struct("Fixation")
            .field("kind", &kind)
            .field("records", &self.record_count())
            .field("group_key", &self.group_key())
            .finish()
    }
}
