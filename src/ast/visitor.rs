//! Visitor pattern for argument tree traversal

use super::expression::{Argument, FunctionCall, ObjectConstructor, PathReference};
use crate::model::Value;

/// Trait for visiting argument nodes
///
/// Every method defaults to walking the children, so implementors only
/// override the nodes they care about.
pub trait Visitor {
    /// Visit any argument node
    fn visit_argument(&mut self, argument: &Argument) {
        walk_argument(self, argument);
    }

    /// Visit a literal
    fn visit_literal(&mut self, _value: &Value) {}

    /// Visit a path reference
    fn visit_path(&mut self, _path: &PathReference) {}

    /// Visit a function call
    fn visit_call(&mut self, call: &FunctionCall) {
        for arg in &call.args {
            self.visit_argument(arg);
        }
    }

    /// Visit an object constructor
    fn visit_object(&mut self, object: &ObjectConstructor) {
        for (_, argument) in object.fields() {
            self.visit_argument(argument);
        }
    }

    /// Visit a sequence constructor
    fn visit_sequence(&mut self, items: &[Argument]) {
        for item in items {
            self.visit_argument(item);
        }
    }
}

/// Dispatch an argument to the matching visitor method
pub fn walk_argument<V: Visitor + ?Sized>(visitor: &mut V, argument: &Argument) {
    match argument {
        Argument::Literal(value) => visitor.visit_literal(value),
        Argument::Path(path) => visitor.visit_path(path),
        Argument::Call(call) => visitor.visit_call(call),
        Argument::Object(object) => visitor.visit_object(object),
        Argument::Sequence(items) => visitor.visit_sequence(items),
    }
}

/// Collects path references that are not inside an aggregate call's arguments
#[derive(Debug, Default)]
pub struct UngroupedPathCollector {
    aggregate_depth: usize,
    /// Paths found outside aggregate arguments
    pub paths: Vec<PathReference>,
}

impl Visitor for UngroupedPathCollector {
    fn visit_path(&mut self, path: &PathReference) {
        if self.aggregate_depth == 0 {
            self.paths.push(path.clone());
        }
    }

    fn visit_call(&mut self, call: &FunctionCall) {
        if call.aggregate {
            self.aggregate_depth += 1;
        }
        for arg in &call.args {
            self.visit_argument(arg);
        }
        if call.aggregate {
            self.aggregate_depth -= 1;
        }
    }
}
