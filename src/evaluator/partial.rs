//! Per-group partial aggregate results

use super::{EvaluationError, EvaluationResult};
use crate::ast::FunctionCall;
use crate::model::Value;
use crate::registry::AggregateFunction;
use std::fmt;
use std::sync::Arc;

/// Partial results of every aggregate call of one transformation output, for one group
///
/// Slot `i` belongs to the aggregate call numbered `i` by
/// [`Evaluator::prepare`](super::Evaluator::prepare). A slot stays empty until
/// a record contributes to it.
#[derive(Clone)]
pub struct PartialResults {
    functions: Arc<[Arc<dyn AggregateFunction>]>,
    values: Vec<Option<Value>>,
}

impl PartialResults {
    /// Empty slots for the given aggregate functions
    pub fn new(functions: Vec<Arc<dyn AggregateFunction>>) -> Self {
        let values = vec![None; functions.len()];
        Self {
            functions: functions.into(),
            values,
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no aggregate slots
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current partial result of a slot
    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot).and_then(Option::as_ref)
    }

    fn check_slot(&self, call: &FunctionCall) -> EvaluationResult<usize> {
        let slot = call.slot();
        match self.functions.get(slot) {
            Some(function) if function.name().eq_ignore_ascii_case(&call.name) => Ok(slot),
            _ => Err(EvaluationError::malformed_specification(format!(
                "aggregate {call} has no prepared slot"
            ))),
        }
    }

    pub(crate) fn function(&self, call: &FunctionCall) -> EvaluationResult<Arc<dyn AggregateFunction>> {
        let slot = self.check_slot(call)?;
        Ok(Arc::clone(&self.functions[slot]))
    }

    /// Combine one record's seeded contribution into the call's slot
    pub fn contribute(&mut self, call: &FunctionCall, seed: Value) -> EvaluationResult<()> {
        let slot = self.check_slot(call)?;
        let merged = match self.values[slot].take() {
            Some(previous) => self.functions[slot].combine(&previous, &seed)?,
            None => seed,
        };
        self.values[slot] = Some(merged);
        Ok(())
    }

    /// Merge another group's partial results into these, slot by slot
    pub fn combine(&mut self, other: PartialResults) -> EvaluationResult<()> {
        if self.values.len() != other.values.len() {
            return Err(EvaluationError::malformed_specification(format!(
                "cannot combine {} partial results with {}",
                self.values.len(),
                other.values.len()
            )));
        }

        for (slot, incoming) in other.values.into_iter().enumerate() {
            let Some(incoming) = incoming else {
                continue;
            };
            let merged = match self.values[slot].take() {
                Some(current) => self.functions[slot].combine(&current, &incoming)?,
                None => incoming,
            };
            self.values[slot] = Some(merged);
        }
        Ok(())
    }

    /// Output value of the call's slot
    ///
    /// A slot that received nothing yields the function's empty result, or
    /// `PathNotFound` when the function has none.
    pub fn finish(&self, call: &FunctionCall) -> EvaluationResult<Value> {
        let slot = self.check_slot(call)?;
        let function = &self.functions[slot];
        match &self.values[slot] {
            Some(partial) => Ok(function.finish(partial)?),
            None => function
                .empty()
                .ok_or_else(|| EvaluationError::path_not_found(call.to_string())),
        }
    }
}

impl fmt::Debug for PartialResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.functions
                    .iter()
                    .zip(&self.values)
                    .map(|(function, value)| (function.name(), value)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Argument;
    use crate::evaluator::{ErrorKind, Evaluator};

    fn prepared(argument: &mut Argument) -> PartialResults {
        Evaluator::default().prepare(argument).unwrap()
    }

    fn first_call(argument: &Argument) -> &FunctionCall {
        match argument {
            Argument::Call(call) => call,
            _ => panic!("not a call"),
        }
    }

    #[test]
    fn test_combine_slot_tables() {
        let mut argument = Argument::aggregate("SUM", vec![Argument::field("IN.a")]);
        let template = prepared(&mut argument);
        let call = first_call(&argument);

        let mut left = template.clone();
        left.contribute(call, Value::Integer(2)).unwrap();
        let mut right = template.clone();
        right.contribute(call, Value::Integer(5)).unwrap();
        right.contribute(call, Value::Integer(1)).unwrap();

        left.combine(right).unwrap();
        assert_eq!(left.finish(call).unwrap(), Value::Integer(8));

        let mut empty = template.clone();
        empty.combine(template).unwrap();
        assert_eq!(empty.finish(call).unwrap_err().kind(), ErrorKind::PathNotFound);
    }

    #[test]
    fn test_empty_result_for_unfed_slot() {
        let mut argument = Argument::aggregate("COUNT", vec![]);
        let partials = prepared(&mut argument);
        assert_eq!(
            partials.finish(first_call(&argument)).unwrap(),
            Value::Integer(0)
        );
    }

    #[test]
    fn test_unprepared_call_is_rejected() {
        let mut argument = Argument::aggregate("SUM", vec![Argument::field("IN.a")]);
        let partials = prepared(&mut argument);
        let stranger = FunctionCall::new("MAX", vec![], true);
        assert_eq!(
            partials.finish(&stranger).unwrap_err().kind(),
            ErrorKind::MalformedSpecification
        );
    }
}
