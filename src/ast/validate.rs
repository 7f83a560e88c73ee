//! Structural validation of argument trees
//!
//! Trees own their children, so cycles cannot be expressed; what remains to be
//! checked once at construction time is shape: path syntax, unique field names,
//! aggregate placement and a depth bound that keeps recursive evaluation safe.

use super::expression::{Argument, FunctionCall, ObjectConstructor, PathReference, PathStep};
use super::visitor::{Visitor, walk_argument};
use crate::evaluator::{EvaluationError, EvaluationResult};
use rustc_hash::FxHashSet;

/// Depth used when no configuration is supplied
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Validating visitor; stops at the first problem
#[derive(Debug)]
pub struct Validator {
    max_depth: usize,
    depth: usize,
    aggregate_depth: usize,
    aggregates_forbidden_in: Option<&'static str>,
    error: Option<EvaluationError>,
}

impl Validator {
    /// Create a validator with the given depth bound
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            depth: 0,
            aggregate_depth: 0,
            aggregates_forbidden_in: None,
            error: None,
        }
    }

    /// Reject aggregate calls, naming `context` in the error
    pub fn forbid_aggregates(mut self, context: &'static str) -> Self {
        self.aggregates_forbidden_in = Some(context);
        self
    }

    /// Validate one tree
    pub fn validate(&mut self, argument: &Argument) -> EvaluationResult<()> {
        self.visit_argument(argument);
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(EvaluationError::malformed_specification(message));
        }
    }
}

impl Visitor for Validator {
    fn visit_argument(&mut self, argument: &Argument) {
        if self.error.is_some() {
            return;
        }
        self.depth += 1;
        if self.depth > self.max_depth {
            self.fail(format!(
                "expression nested deeper than {} levels",
                self.max_depth
            ));
        } else {
            walk_argument(self, argument);
        }
        self.depth -= 1;
    }

    fn visit_path(&mut self, path: &PathReference) {
        match path.steps().first() {
            None => self.fail("empty path reference".to_string()),
            Some(PathStep::Index(_)) => {
                self.fail(format!("path '{path}' must start with a binding name"))
            }
            Some(PathStep::Field(_)) => {
                if path
                    .steps()
                    .iter()
                    .any(|step| matches!(step, PathStep::Field(name) if name.is_empty()))
                {
                    self.fail(format!("path '{path}' contains an empty field name"));
                }
            }
        }
    }

    fn visit_call(&mut self, call: &FunctionCall) {
        if call.name.is_empty() {
            self.fail("function call without a name".to_string());
            return;
        }
        if call.aggregate {
            if let Some(context) = self.aggregates_forbidden_in {
                self.fail(format!("aggregate {call} is not allowed in {context}"));
                return;
            }
            if self.aggregate_depth > 0 {
                self.fail(format!("aggregate {call} is nested inside another aggregate"));
                return;
            }
            self.aggregate_depth += 1;
        }
        for arg in &call.args {
            self.visit_argument(arg);
        }
        if call.aggregate {
            self.aggregate_depth -= 1;
        }
    }

    fn visit_object(&mut self, object: &ObjectConstructor) {
        let mut seen = FxHashSet::default();
        for (name, _) in object.fields() {
            if name.is_empty() {
                self.fail("object field without a name".to_string());
                return;
            }
            if !seen.insert(name.as_str()) {
                self.fail(format!("duplicate object field '{name}'"));
                return;
            }
        }
        for (_, argument) in object.fields() {
            self.visit_argument(argument);
        }
    }
}

impl Argument {
    /// Validate the tree's structure
    pub fn validate(&self, max_depth: usize) -> EvaluationResult<()> {
        Validator::new(max_depth).validate(self)
    }
}
