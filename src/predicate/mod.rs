//! Predicates gating input records and output objects
//!
//! A predicate is a boolean tree over [`Argument`]s. Its operands see the
//! fixation they are evaluated under with `@` additionally bound to the
//! candidate value, so an output predicate can write `OUT.sum > 3` or
//! `@.sum > 3` interchangeably.

#![warn(missing_docs)]

use crate::ast::{Argument, Validator};
use crate::evaluator::{EvaluationError, EvaluationResult, Evaluator, ValueEvaluationResult};
use crate::fixation::{CURRENT_BINDING, Fixation};
use crate::model::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl ComparisonOperator {
    /// Surface symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Apply the operator; incompatible operands fail with `TypeMismatch`
    pub fn apply(self, left: &Value, right: &Value) -> EvaluationResult<bool> {
        match self {
            Self::Eq => left.equals(right),
            Self::Ne => left.equals(right).map(|equal| !equal),
            Self::Lt => Ok(left.compare(right)? == Ordering::Less),
            Self::Le => Ok(left.compare(right)? != Ordering::Greater),
            Self::Gt => Ok(left.compare(right)? == Ordering::Greater),
            Self::Ge => Ok(left.compare(right)? != Ordering::Less),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Boolean expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Compare two operands
    Comparison {
        /// Operator
        op: ComparisonOperator,
        /// Left operand
        left: Argument,
        /// Right operand
        right: Argument,
    },
    /// All operands hold; short-circuits, empty is true
    And(Vec<Predicate>),
    /// Some operand holds; short-circuits, empty is false
    Or(Vec<Predicate>),
    /// Operand does not hold
    Not(Box<Predicate>),
    /// The argument can be evaluated without running into absent data
    Exists(Argument),
}

impl Predicate {
    /// Comparison predicate
    pub fn comparison(op: ComparisonOperator, left: Argument, right: Argument) -> Self {
        Self::Comparison { op, left, right }
    }

    /// `left = right`
    pub fn equals(left: Argument, right: Argument) -> Self {
        Self::comparison(ComparisonOperator::Eq, left, right)
    }

    /// `left > right`
    pub fn greater_than(left: Argument, right: Argument) -> Self {
        Self::comparison(ComparisonOperator::Gt, left, right)
    }

    /// `left >= right`
    pub fn at_least(left: Argument, right: Argument) -> Self {
        Self::comparison(ComparisonOperator::Ge, left, right)
    }

    /// `left < right`
    pub fn less_than(left: Argument, right: Argument) -> Self {
        Self::comparison(ComparisonOperator::Lt, left, right)
    }

    /// Conjunction
    pub fn and(operands: Vec<Predicate>) -> Self {
        Self::And(operands)
    }

    /// Disjunction
    pub fn or(operands: Vec<Predicate>) -> Self {
        Self::Or(operands)
    }

    /// Negation
    pub fn negate(operand: Predicate) -> Self {
        Self::Not(Box::new(operand))
    }

    /// Existence check
    pub fn exists(argument: Argument) -> Self {
        Self::Exists(argument)
    }

    /// Check structure: argument shapes, no aggregate calls, bounded nesting
    pub fn validate(&self, max_depth: usize) -> EvaluationResult<()> {
        self.validate_at(1, max_depth)
    }

    fn validate_at(&self, depth: usize, max_depth: usize) -> EvaluationResult<()> {
        if depth > max_depth {
            return Err(EvaluationError::malformed_specification(format!(
                "predicate nested deeper than {max_depth} levels"
            )));
        }
        let check = |argument: &Argument| {
            Validator::new(max_depth)
                .forbid_aggregates("predicates")
                .validate(argument)
        };
        match self {
            Self::Comparison { left, right, .. } => {
                check(left)?;
                check(right)
            }
            Self::And(operands) | Self::Or(operands) => operands
                .iter()
                .try_for_each(|p| p.validate_at(depth + 1, max_depth)),
            Self::Not(operand) => operand.validate_at(depth + 1, max_depth),
            Self::Exists(argument) => check(argument),
        }
    }

    /// Evaluate against a candidate value
    ///
    /// Comparisons whose operands are absent or incompatible are unknown.
    /// Unknown survives `Not` and decides `And`/`Or` only when no other operand
    /// does, and a predicate that ends up unknown does not pass. `Exists` is
    /// false for absent data and returns every other error, as do errors
    /// outside the absorbable set.
    pub fn evaluate(
        &self,
        evaluator: &Evaluator,
        candidate: &ValueEvaluationResult,
        fixation: &Fixation,
    ) -> EvaluationResult<bool> {
        let scope = fixation.bind(CURRENT_BINDING, candidate.value.clone());
        Ok(self.eval(evaluator, &scope)?.unwrap_or(false))
    }

    /// Three-valued evaluation; `None` is unknown
    fn eval(&self, evaluator: &Evaluator, scope: &Fixation) -> EvaluationResult<Option<bool>> {
        match self {
            Self::Comparison { op, left, right } => {
                let outcome = evaluator.evaluate(left, scope).and_then(|left| {
                    let right = evaluator.evaluate(right, scope)?;
                    op.apply(&left.value, &right.value)
                });
                match outcome {
                    Ok(holds) => Ok(Some(holds)),
                    Err(err) if err.is_absorbable() => {
                        log::trace!("comparison {self} is unknown: {err}");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
            Self::And(operands) => {
                let mut truth = Some(true);
                for operand in operands {
                    match operand.eval(evaluator, scope)? {
                        Some(false) => return Ok(Some(false)),
                        None => truth = None,
                        Some(true) => {}
                    }
                }
                Ok(truth)
            }
            Self::Or(operands) => {
                let mut truth = Some(false);
                for operand in operands {
                    match operand.eval(evaluator, scope)? {
                        Some(true) => return Ok(Some(true)),
                        None => truth = None,
                        Some(false) => {}
                    }
                }
                Ok(truth)
            }
            Self::Not(operand) => Ok(operand.eval(evaluator, scope)?.map(|holds| !holds)),
            Self::Exists(argument) => match evaluator.evaluate(argument, scope) {
                Ok(_) => Ok(Some(true)),
                Err(err) if err.is_absence() => Ok(Some(false)),
                Err(err) => Err(err),
            },
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Predicate) -> fmt::Result {
    match operand {
        Predicate::And(_) | Predicate::Or(_) => write!(f, "({operand})"),
        _ => write!(f, "{operand}"),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison { op, left, right } => write!(f, "{left} {op} {right}"),
            Self::And(operands) if operands.is_empty() => write!(f, "true"),
            Self::Or(operands) if operands.is_empty() => write!(f, "false"),
            Self::And(operands) | Self::Or(operands) => {
                let joiner = if matches!(self, Self::And(_)) { " && " } else { " || " };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    write_operand(f, operand)?;
                }
                Ok(())
            }
            Self::Not(operand) => write!(f, "!({operand})"),
            Self::Exists(argument) => write!(f, "EXISTS({argument})"),
        }
    }
}
