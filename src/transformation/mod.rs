//! Transformations and their orchestration
//!
//! A [`Transformation`] ties an output specification to two engines and two
//! optional predicates. Running it moves through
//! `Idle -> Matching -> Grouping -> Emitting -> Done`: input records are
//! matched against the input predicate, folded into the group their grouping
//! key selects, and once the input is exhausted every group is turned into one
//! output object, filtered by the output predicate and written to the sink.
//!
//! The grouping key of a record is the list of values of the output fields
//! that contain no aggregate call. Fields with aggregates are computed
//! incrementally from partial results, which is why they may only read the
//! input inside aggregate arguments.

#![warn(missing_docs)]

mod builder;
mod config;
mod groups;
mod run;

pub use builder::TransformationBuilder;
pub use config::TransformationConfig;

use crate::ast::{Argument, ObjectConstructor, UngroupedPathCollector, Visitor};
use crate::engines::{InputEngine, OutputEngine};
use crate::evaluator::{EvaluationError, EvaluationResult, Evaluator, PartialResults, ValueEvaluationResult};
use crate::fixation::Fixation;
use crate::model::Value;
use crate::predicate::Predicate;
use crate::registry::FunctionRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// States of a transformation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Not started
    Idle,
    /// Pulling records and applying the input predicate
    Matching,
    /// Folding a matched record into its group
    Grouping,
    /// Producing, filtering and writing output objects
    Emitting,
    /// Finished successfully
    Done,
    /// Aborted by a fatal error
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Matching => "matching",
            Self::Grouping => "grouping",
            Self::Emitting => "emitting",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records pulled from the input
    pub records_read: usize,
    /// Records that passed the input predicate
    pub records_matched: usize,
    /// Records that failed the input predicate
    pub records_rejected: usize,
    /// Malformed records skipped in lenient mode
    pub records_skipped: usize,
    /// Output groups formed
    pub groups: usize,
    /// Objects written to the sink
    pub emitted: usize,
    /// Records whose grouping key and objects whose fields ran into absent or mistyped data
    pub dropped: usize,
    /// Objects that failed the output predicate
    pub filtered: usize,
}

impl RunSummary {
    /// Add the matching-phase counters of a partition
    pub(crate) fn add_partition(&mut self, other: &RunSummary) {
        self.records_read += other.records_read;
        self.records_matched += other.records_matched;
        self.records_rejected += other.records_rejected;
        self.records_skipped += other.records_skipped;
        self.dropped += other.dropped;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {}, matched {}, rejected {}, skipped {}, groups {}, emitted {}, dropped {}, filtered {}",
            self.records_read,
            self.records_matched,
            self.records_rejected,
            self.records_skipped,
            self.groups,
            self.emitted,
            self.dropped,
            self.filtered
        )
    }
}

/// One output field with its role in grouping
#[derive(Debug, Clone)]
pub(crate) struct OutputField {
    pub(crate) name: String,
    pub(crate) argument: Argument,
    pub(crate) aggregate: bool,
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.name, self.argument)
    }
}

/// Immutable unit of work: output fields, predicates and engines
pub struct Transformation {
    in_engine: Arc<dyn InputEngine>,
    out_engine: Arc<dyn OutputEngine>,
    in_predicate: Option<Predicate>,
    out_predicate: Option<Predicate>,
    fields: Vec<OutputField>,
    template: PartialResults,
    evaluator: Evaluator,
    config: TransformationConfig,
}

impl Transformation {
    /// Start building a transformation between two engines
    pub fn builder(
        in_engine: impl InputEngine + 'static,
        out_engine: impl OutputEngine + 'static,
    ) -> TransformationBuilder {
        TransformationBuilder::new(Arc::new(in_engine), Arc::new(out_engine))
    }

    /// Create a transformation with the standard registry and default configuration
    pub fn new(
        in_predicate: Option<Predicate>,
        out_predicate: Option<Predicate>,
        in_engine: Arc<dyn InputEngine>,
        out_engine: Arc<dyn OutputEngine>,
        fields: ObjectConstructor,
    ) -> EvaluationResult<Self> {
        Self::assemble(
            in_engine,
            out_engine,
            in_predicate,
            out_predicate,
            fields,
            FunctionRegistry::standard(),
            TransformationConfig::default(),
        )
    }

    pub(crate) fn assemble(
        in_engine: Arc<dyn InputEngine>,
        out_engine: Arc<dyn OutputEngine>,
        in_predicate: Option<Predicate>,
        out_predicate: Option<Predicate>,
        mut output: ObjectConstructor,
        registry: Arc<FunctionRegistry>,
        config: TransformationConfig,
    ) -> EvaluationResult<Self> {
        if output.is_empty() {
            return Err(EvaluationError::malformed_specification(
                "output specification has no fields",
            ));
        }

        let max_depth = config.max_expression_depth;
        let root = Argument::Object(output.clone());
        root.validate(max_depth)?;
        for predicate in in_predicate.iter().chain(&out_predicate) {
            predicate.validate(max_depth)?;
        }

        let mut next = 0;
        let mut names = Vec::new();
        for (_, argument) in output.fields_mut() {
            argument.assign_aggregate_slots(&mut next, &mut names);
        }
        let evaluator = Evaluator::new(registry);
        let template = evaluator.slots_for(&names)?;

        let mut fields = Vec::with_capacity(output.len());
        for (name, argument) in output.fields() {
            let aggregate = argument.contains_aggregate();
            if aggregate {
                let mut collector = UngroupedPathCollector::default();
                collector.visit_argument(argument);
                if let Some(path) = collector.paths.first() {
                    return Err(EvaluationError::malformed_specification(format!(
                        "field '{name}' reads {path} outside an aggregate"
                    )));
                }
            }
            fields.push(OutputField {
                name: name.clone(),
                argument: argument.clone(),
                aggregate,
            });
        }

        log::debug!(
            "transformation with {} grouping and {} aggregate fields, {} aggregate slots",
            fields.iter().filter(|f| !f.aggregate).count(),
            fields.iter().filter(|f| f.aggregate).count(),
            template.len()
        );

        Ok(Self {
            in_engine,
            out_engine,
            in_predicate,
            out_predicate,
            fields,
            template,
            evaluator,
            config,
        })
    }

    /// Input predicate, if any
    pub fn in_predicate(&self) -> Option<&Predicate> {
        self.in_predicate.as_ref()
    }

    /// Output predicate, if any
    pub fn out_predicate(&self) -> Option<&Predicate> {
        self.out_predicate.as_ref()
    }

    /// Configuration
    pub fn config(&self) -> &TransformationConfig {
        &self.config
    }

    /// Evaluator bound to this transformation's registry
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Names of the output fields forming the grouping key
    pub fn grouping_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| !field.aggregate)
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Output specification as an argument tree
    pub fn output(&self) -> Argument {
        Argument::Object(
            self.fields
                .iter()
                .map(|field| (field.name.clone(), field.argument.clone()))
                .collect(),
        )
    }

    /// Whether `record` passes the input predicate
    ///
    /// Always true without an input predicate. Absent or mistyped data makes
    /// the record fail the gate; other errors are returned.
    pub fn satisfies_in_predicate(&self, record: &Value) -> EvaluationResult<bool> {
        self.gate_input(record, &Fixation::from_record(record.clone()))
    }

    pub(crate) fn gate_input(&self, record: &Value, fixation: &Fixation) -> EvaluationResult<bool> {
        let Some(predicate) = &self.in_predicate else {
            return Ok(true);
        };
        let candidate = ValueEvaluationResult::new(record.clone(), fixation.clone());
        absorb(predicate.evaluate(&self.evaluator, &candidate, fixation))
    }

    pub(crate) fn gate_output(&self, object: &Value, group: &Fixation) -> EvaluationResult<bool> {
        let Some(predicate) = &self.out_predicate else {
            return Ok(true);
        };
        let fixation = Fixation::from_output(object.clone()).chain(group);
        let candidate = ValueEvaluationResult::new(object.clone(), group.clone());
        absorb(predicate.evaluate(&self.evaluator, &candidate, &fixation))
    }
}

fn absorb(outcome: EvaluationResult<bool>) -> EvaluationResult<bool> {
    match outcome {
        Err(err) if err.is_absorbable() => {
            log::trace!("predicate absorbed {err}");
            Ok(false)
        }
        other => other,
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("in_engine", &self.in_engine.to_string())
            .field("out_engine", &self.out_engine.to_string())
            .field("in_predicate", &self.in_predicate)
            .field("out_predicate", &self.out_predicate)
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish()
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IN-ENGINE: {},", self.in_engine)?;
        writeln!(f, "OUT-ENGINE: {},", self.out_engine)?;
        if let Some(predicate) = &self.in_predicate {
            writeln!(f, "IN-FILTER: {predicate},")?;
        }
        if let Some(predicate) = &self.out_predicate {
            writeln!(f, "OUT-FILTER: {predicate},")?;
        }
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "OUT.{field}")?;
        }
        Ok(())
    }
}
