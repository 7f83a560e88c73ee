//! Argument tree evaluator
//!
//! Evaluation is a recursive descent over an [`Argument`] tree under a
//! [`Fixation`]. Aggregate calls have two modes: one-shot evaluation folds the
//! aggregate over the records of the fixation right away, while grouped
//! evaluation reads partial results that were accumulated record by record
//! with [`Evaluator::accumulate`].

#![warn(missing_docs)]

mod error;
mod partial;

pub use error::{ErrorKind, EvaluationError, EvaluationResult};
pub use partial::PartialResults;

use crate::ast::{Argument, FunctionCall, ObjectConstructor, PathReference, PathStep, Visitor};
use crate::fixation::Fixation;
use crate::model::{ObjectValue, Value};
use crate::registry::{AggregateFunction, FunctionRegistry};
use std::sync::Arc;

/// Value produced by an argument, together with the fixation it was produced under
#[derive(Debug, Clone)]
pub struct ValueEvaluationResult {
    /// Produced value
    pub value: Value,
    /// Fixation the value was evaluated under
    pub fixation: Fixation,
}

impl ValueEvaluationResult {
    /// Pair a value with its fixation
    pub fn new(value: Value, fixation: Fixation) -> Self {
        Self { value, fixation }
    }

    /// Consume the result, keeping the value
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// How aggregate calls are answered during a walk
#[derive(Clone, Copy)]
enum AggregateMode<'a> {
    OneShot,
    Grouped(&'a PartialResults),
}

/// Evaluates argument trees against fixations
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<FunctionRegistry>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(FunctionRegistry::standard())
    }
}

impl Evaluator {
    /// Create an evaluator over the given registry
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }

    /// Function registry used for dispatch
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Number the aggregate calls of `argument` and build the matching empty partial results
    ///
    /// Fails with `UndefinedFunction` when an aggregate name is not registered.
    pub fn prepare(&self, argument: &mut Argument) -> EvaluationResult<PartialResults> {
        let mut next = 0;
        let mut names = Vec::new();
        argument.assign_aggregate_slots(&mut next, &mut names);
        self.slots_for(&names)
    }

    /// Empty partial results for aggregates already numbered in `names` order
    pub(crate) fn slots_for(&self, names: &[String]) -> EvaluationResult<PartialResults> {
        let functions = names
            .iter()
            .map(|name| self.registry.aggregate(name).cloned())
            .collect::<EvaluationResult<Vec<_>>>()?;
        Ok(PartialResults::new(functions))
    }

    /// One-shot evaluation
    pub fn evaluate(
        &self,
        argument: &Argument,
        fixation: &Fixation,
    ) -> EvaluationResult<ValueEvaluationResult> {
        let value = self.eval(argument, fixation, AggregateMode::OneShot)?;
        Ok(ValueEvaluationResult::new(value, fixation.clone()))
    }

    /// Evaluate under a group's final fixation, answering aggregates from `partials`
    pub fn evaluate_grouped(
        &self,
        argument: &Argument,
        fixation: &Fixation,
        partials: &PartialResults,
    ) -> EvaluationResult<ValueEvaluationResult> {
        let value = self.eval(argument, fixation, AggregateMode::Grouped(partials))?;
        Ok(ValueEvaluationResult::new(value, fixation.clone()))
    }

    /// Fold the aggregate arguments of one record into `partials`
    ///
    /// An aggregate whose arguments fail with an absorbable error receives no
    /// contribution from this record. Seed and combine failures are returned.
    pub fn accumulate(
        &self,
        argument: &Argument,
        record: &Fixation,
        partials: &mut PartialResults,
    ) -> EvaluationResult<()> {
        let mut accumulator = Accumulator {
            evaluator: self,
            record,
            partials,
            error: None,
        };
        accumulator.visit_argument(argument);
        match accumulator.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn eval(
        &self,
        argument: &Argument,
        fixation: &Fixation,
        mode: AggregateMode<'_>,
    ) -> EvaluationResult<Value> {
        match argument {
            Argument::Literal(value) => Ok(value.clone()),
            Argument::Path(path) => resolve_path(path, fixation).cloned(),
            Argument::Call(call) if call.aggregate => match mode {
                AggregateMode::OneShot => self.fold_aggregate(call, fixation),
                AggregateMode::Grouped(partials) => partials.finish(call),
            },
            Argument::Call(call) => self.call_scalar(call, fixation, mode),
            Argument::Object(object) => self.eval_object(object, fixation, mode),
            Argument::Sequence(items) => items
                .iter()
                .map(|item| self.eval(item, fixation, mode))
                .collect::<EvaluationResult<Vec<_>>>()
                .map(Value::Sequence),
        }
    }

    fn eval_object(
        &self,
        object: &ObjectConstructor,
        fixation: &Fixation,
        mode: AggregateMode<'_>,
    ) -> EvaluationResult<Value> {
        let mut fields = ObjectValue::with_capacity(object.len());
        for (name, argument) in object.fields() {
            fields.insert(name.clone(), self.eval(argument, fixation, mode)?);
        }
        Ok(Value::Object(fields))
    }

    fn call_scalar(
        &self,
        call: &FunctionCall,
        fixation: &Fixation,
        mode: AggregateMode<'_>,
    ) -> EvaluationResult<Value> {
        let function = self.registry.scalar(&call.name)?;
        let tolerant = function.absence_tolerant();

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            match self.eval(arg, fixation, mode) {
                Ok(value) => args.push(value),
                Err(err) if tolerant && err.is_absence() => args.push(Value::Null),
                Err(err) => return Err(err),
            }
        }

        function.validate_args(&args)?;
        Ok(function.evaluate(&args)?)
    }

    fn aggregate_args(&self, call: &FunctionCall, record: &Fixation) -> EvaluationResult<Vec<Value>> {
        call.args
            .iter()
            .map(|arg| self.eval(arg, record, AggregateMode::OneShot))
            .collect()
    }

    /// Seed one record's contribution; `Ok(None)` when its arguments are absorbed
    fn contribution(
        &self,
        function: &dyn AggregateFunction,
        call: &FunctionCall,
        record: &Fixation,
    ) -> EvaluationResult<Option<Value>> {
        let args = match self.aggregate_args(call, record) {
            Ok(args) => args,
            Err(err) if err.is_absorbable() => {
                log::trace!("{call}: no contribution ({err})");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        function.validate_args(&args)?;
        Ok(Some(function.seed(&args)?))
    }

    fn fold_aggregate(&self, call: &FunctionCall, fixation: &Fixation) -> EvaluationResult<Value> {
        let function = self.registry.aggregate(&call.name)?;

        let records = fixation.records();
        let scopes: Vec<Fixation> = if records.is_empty() {
            vec![fixation.clone()]
        } else {
            records
                .into_iter()
                .map(|record| Fixation::from_record(record.clone()).chain(fixation))
                .collect()
        };

        let mut partial: Option<Value> = None;
        for scope in &scopes {
            if let Some(seed) = self.contribution(function.as_ref(), call, scope)? {
                partial = Some(match partial {
                    Some(acc) => function.combine(&acc, &seed)?,
                    None => seed,
                });
            }
        }

        match partial {
            Some(partial) => Ok(function.finish(&partial)?),
            None => function
                .empty()
                .ok_or_else(|| EvaluationError::path_not_found(call.to_string())),
        }
    }
}

/// Resolve a path against a fixation; absent steps report the whole path
pub fn resolve_path<'a>(path: &PathReference, fixation: &'a Fixation) -> EvaluationResult<&'a Value> {
    let (root, rest) = match path.steps().split_first() {
        Some((PathStep::Field(root), rest)) => (root, rest),
        _ => {
            return Err(EvaluationError::malformed_specification(format!(
                "path '{path}' does not start with a binding name"
            )));
        }
    };

    let mut current = fixation.lookup(root)?;
    for step in rest {
        let next = match step {
            PathStep::Field(name) => current.get_field(name),
            PathStep::Index(index) => current.get_index(*index),
        };
        current = next.map_err(|err| match err {
            EvaluationError::PathNotFound { .. } => EvaluationError::path_not_found(path.to_string()),
            other => other,
        })?;
    }
    Ok(current)
}

/// Visitor feeding every aggregate call of a tree with one record
struct Accumulator<'a> {
    evaluator: &'a Evaluator,
    record: &'a Fixation,
    partials: &'a mut PartialResults,
    error: Option<EvaluationError>,
}

impl Visitor for Accumulator<'_> {
    fn visit_call(&mut self, call: &FunctionCall) {
        if self.error.is_some() {
            return;
        }
        if !call.aggregate {
            for arg in &call.args {
                self.visit_argument(arg);
            }
            return;
        }

        let result = self.partials.function(call).and_then(|function| {
            self.evaluator
                .contribution(function.as_ref(), call, self.record)
        });
        let result = result.and_then(|seed| match seed {
            Some(seed) => self.partials.contribute(call, seed),
            None => Ok(()),
        });
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixation::GroupKey;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(json: serde_json::Value) -> Fixation {
        Fixation::from_record(Value::from(json))
    }

    #[test]
    fn test_literal_round_trip() {
        let evaluator = Evaluator::default();
        for value in [
            Value::Null,
            Value::Integer(-3),
            Value::Float(0.1),
            Value::from("s"),
            Value::from(vec![1u8, 2]),
            Value::from(json!({"a": [1, {"b": null}]})),
        ] {
            let result = evaluator
                .evaluate(&Argument::literal(value.clone()), &Fixation::empty())
                .unwrap();
            assert_eq!(result.value, value);
        }
    }

    #[test]
    fn test_paths() {
        let evaluator = Evaluator::default();
        let fixation = record(json!({"a": {"list": [10, 20]}, "b": "x"}));

        let value = |path: &str| {
            evaluator
                .evaluate(&Argument::path(path.parse().unwrap()), &fixation)
                .map(ValueEvaluationResult::into_value)
        };

        assert_eq!(value("IN.a.list[1]").unwrap(), Value::Integer(20));
        assert_eq!(value("b").unwrap(), Value::from("x"));
        assert_eq!(
            value("IN.a.missing").unwrap_err(),
            EvaluationError::path_not_found("IN.a.missing")
        );
        assert_eq!(value("IN.b.c").unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(value("nope").unwrap_err().kind(), ErrorKind::UnboundVariable);
    }

    #[test]
    fn test_scalar_calls_and_constructors() {
        let evaluator = Evaluator::default();
        let fixation = record(json!({"first": "Ada", "last": "Lovelace", "age": 36}));
        let argument = Argument::object(
            ObjectConstructor::new()
                .with_field(
                    "name",
                    Argument::call(
                        "CONCAT",
                        vec![
                            Argument::field("IN.first"),
                            Argument::literal(" "),
                            Argument::call("UPPER", vec![Argument::field("IN.last")]),
                        ],
                    ),
                )
                .with_field(
                    "ages",
                    Argument::sequence(vec![
                        Argument::field("IN.age"),
                        Argument::call(
                            "ADD",
                            vec![Argument::field("IN.age"), Argument::literal(1)],
                        ),
                    ]),
                ),
        );

        let value = evaluator.evaluate(&argument, &fixation).unwrap().value;
        assert_eq!(value, Value::from(json!({"name": "Ada LOVELACE", "ages": [36, 37]})));
    }

    #[test]
    fn test_call_errors() {
        let evaluator = Evaluator::default();
        let fixation = record(json!({"a": 1}));

        let err = evaluator
            .evaluate(&Argument::call("NOPE", vec![]), &fixation)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedFunction);

        let err = evaluator
            .evaluate(&Argument::call("UPPER", vec![Argument::field("IN.a")]), &fixation)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentTypeMismatch);
    }

    #[test]
    fn test_absence_tolerant_functions() {
        let evaluator = Evaluator::default();
        let fixation = record(json!({"name": "n"}));
        let argument = Argument::call(
            "COALESCE",
            vec![Argument::field("IN.nick"), Argument::field("IN.name")],
        );
        assert_eq!(
            evaluator.evaluate(&argument, &fixation).unwrap().value,
            Value::from("n")
        );

        let present = Argument::call("IS_PRESENT", vec![Argument::field("IN.nick")]);
        assert_eq!(
            evaluator.evaluate(&present, &fixation).unwrap().value,
            Value::Boolean(false)
        );

        // only absence is tolerated, not kind errors
        let argument = Argument::call("COALESCE", vec![Argument::field("IN.name.x")]);
        assert_eq!(
            evaluator.evaluate(&argument, &fixation).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_one_shot_aggregate_over_grouped_fixation() {
        let evaluator = Evaluator::default();
        let key = GroupKey::new(vec![Value::from("x")]);
        let fixation = record(json!({"a": 1, "b": "x"}))
            .merge(&record(json!({"b": "x"})), &key)
            .merge(&record(json!({"a": 2, "b": "x"})), &key);

        let sum = Argument::aggregate("SUM", vec![Argument::field("IN.a")]);
        assert_eq!(
            evaluator.evaluate(&sum, &fixation).unwrap().value,
            Value::Integer(3)
        );

        let count = Argument::aggregate("COUNT", vec![]);
        assert_eq!(
            evaluator.evaluate(&count, &fixation).unwrap().value,
            Value::Integer(3)
        );

        let nothing = Argument::aggregate("MAX", vec![Argument::field("IN.zzz")]);
        assert_eq!(
            evaluator.evaluate(&nothing, &fixation).unwrap_err().kind(),
            ErrorKind::PathNotFound
        );
    }

    #[test]
    fn test_accumulate_then_evaluate_grouped() {
        let evaluator = Evaluator::default();
        let mut argument = Argument::object(
            ObjectConstructor::new()
                .with_field("b", Argument::field("IN.b"))
                .with_field("sum", Argument::aggregate("SUM", vec![Argument::field("IN.a")]))
                .with_field("n", Argument::aggregate("COUNT", vec![])),
        );
        let template = evaluator.prepare(&mut argument).unwrap();
        assert_eq!(template.len(), 2);

        let key = GroupKey::new(vec![Value::from("x")]);
        let inputs = [json!({"a": 1, "b": "x"}), json!({"b": "x"}), json!({"a": 2, "b": "x"})];

        let mut partials = template.clone();
        let mut group: Option<Fixation> = None;
        for input in inputs {
            let fixation = record(input);
            evaluator
                .accumulate(&argument, &fixation, &mut partials)
                .unwrap();
            group = Some(match group {
                Some(group) => group.merge(&fixation, &key),
                None => fixation,
            });
        }

        let value = evaluator
            .evaluate_grouped(&argument, &group.unwrap(), &partials)
            .unwrap()
            .value;
        assert_eq!(value, Value::from(json!({"b": "x", "sum": 3, "n": 3})));
    }

    #[test]
    fn test_prepare_rejects_unknown_aggregate() {
        let evaluator = Evaluator::default();
        let mut argument = Argument::aggregate("MEDIAN", vec![Argument::field("IN.a")]);
        assert_eq!(
            evaluator.prepare(&mut argument).unwrap_err().kind(),
            ErrorKind::UndefinedFunction
        );
    }

    #[test]
    fn test_seed_errors_are_fatal() {
        let evaluator = Evaluator::default();
        let mut argument = Argument::aggregate("SUM", vec![Argument::field("IN.a")]);
        let mut partials = evaluator.prepare(&mut argument).unwrap();
        let err = evaluator
            .accumulate(&argument, &record(json!({"a": "text"})), &mut partials)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentTypeMismatch);
    }
}
