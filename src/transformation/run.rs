//! Run orchestration: matching, grouping, partition barrier and emitting

use super::groups::GroupTable;
use super::{OutputField, RunState, RunSummary, Transformation};
use crate::engines::{EngineError, RecordSink, RecordSource};
use crate::error::{Result, TransformationError};
use crate::evaluator::{EvaluationError, EvaluationResult, PartialResults};
use crate::fixation::{Fixation, GroupKey};
use crate::model::{ObjectValue, Value};
use std::panic;

fn read_failure(err: EngineError) -> EvaluationError {
    EvaluationError::MalformedInput {
        message: err.to_string(),
    }
}

fn write_failure(err: EngineError) -> EvaluationError {
    EvaluationError::SinkWriteFailure {
        message: err.to_string(),
    }
}

/// Source that is never pulled again once it reported exhaustion
struct Latched<'s> {
    source: &'s mut dyn RecordSource,
    exhausted: bool,
}

impl<'s> Latched<'s> {
    fn new(source: &'s mut dyn RecordSource) -> Self {
        Self {
            source,
            exhausted: false,
        }
    }

    fn next(&mut self) -> EvaluationResult<Option<Value>> {
        if self.exhausted {
            return Ok(None);
        }
        let record = self.source.next_record().map_err(read_failure)?;
        self.exhausted = record.is_none();
        Ok(record)
    }
}

/// Mutable state of one run (or one partition of a partitioned run)
struct Run<'t> {
    transformation: &'t Transformation,
    state: RunState,
    table: GroupTable,
    summary: RunSummary,
}

impl<'t> Run<'t> {
    fn new(transformation: &'t Transformation) -> Self {
        Self {
            transformation,
            state: RunState::Idle,
            table: GroupTable::new(),
            summary: RunSummary::default(),
        }
    }

    fn enter(&mut self, state: RunState) {
        if self.state != state {
            log::trace!("{} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn fail(&mut self, err: TransformationError) -> TransformationError {
        log::debug!("run failed while {}: {}", err.state, err.source);
        self.state = RunState::Failed;
        err
    }

    /// Pull every record of `source` into the group table
    fn consume(&mut self, source: &mut dyn RecordSource) -> Result<()> {
        let mut source = Latched::new(source);
        loop {
            self.enter(RunState::Matching);
            let record = source
                .next()
                .map_err(|err| TransformationError::new(err, RunState::Matching))?;
            let Some(record) = record else {
                log::debug!("input exhausted after {} records", self.summary.records_read);
                return Ok(());
            };
            self.ingest(record)?;
        }
    }

    fn ingest(&mut self, record: Value) -> Result<()> {
        self.summary.records_read += 1;
        log::trace!("record {}: {record}", self.summary.records_read);

        if !matches!(record, Value::Object(_)) {
            let err = EvaluationError::MalformedInput {
                message: format!("expected an object record, got {}", record.kind()),
            };
            if self.transformation.config.skip_malformed_input {
                log::warn!("skipping record {}: {err}", self.summary.records_read);
                self.summary.records_skipped += 1;
                return Ok(());
            }
            return Err(TransformationError::new(err, RunState::Matching).with_record(&record));
        }

        let fixation = Fixation::from_record(record.clone());
        let passes = self
            .transformation
            .gate_input(&record, &fixation)
            .map_err(|err| {
                let mut err = TransformationError::new(err, RunState::Matching).with_record(&record);
                if let Some(predicate) = &self.transformation.in_predicate {
                    err = err.with_argument(predicate);
                }
                err
            })?;
        if !passes {
            self.summary.records_rejected += 1;
            return Ok(());
        }
        self.summary.records_matched += 1;

        self.enter(RunState::Grouping);
        let Some(key) = self.group_key(&record, &fixation)? else {
            self.summary.dropped += 1;
            return Ok(());
        };

        let transformation = self.transformation;
        let partials = self.table.join(key, &fixation, &transformation.template);
        for field in transformation.fields.iter().filter(|f| f.aggregate) {
            transformation
                .evaluator
                .accumulate(&field.argument, &fixation, partials)
                .map_err(|err| {
                    TransformationError::new(err, RunState::Grouping)
                        .with_argument(field)
                        .with_record(&record)
                })?;
        }
        Ok(())
    }

    /// Grouping key of a record, or `None` when a grouping field is absent or mistyped
    fn group_key(&self, record: &Value, fixation: &Fixation) -> Result<Option<GroupKey>> {
        let evaluator = &self.transformation.evaluator;
        let mut values = Vec::new();
        for field in self.transformation.fields.iter().filter(|f| !f.aggregate) {
            match evaluator.evaluate(&field.argument, fixation) {
                Ok(result) => values.push(result.into_value()),
                Err(err) if err.is_absorbable() => {
                    log::trace!("record dropped, field {field}: {err}");
                    return Ok(None);
                }
                Err(err) => {
                    return Err(TransformationError::new(err, RunState::Grouping)
                        .with_argument(field)
                        .with_record(record));
                }
            }
        }
        Ok(Some(GroupKey::new(values)))
    }

    /// Produce, filter and write one object per group, then flush the sink
    fn emit(mut self, sink: &mut dyn RecordSink) -> Result<RunSummary> {
        self.enter(RunState::Emitting);
        let transformation = self.transformation;
        self.summary.groups = self.table.len();
        log::debug!("emitting {} groups", self.summary.groups);

        let table = std::mem::take(&mut self.table);
        for (key, group) in table.into_groups() {
            let object = match self.build_object(&key, &group.fixation, &group.partials) {
                Ok(Some(object)) => object,
                Ok(None) => {
                    self.summary.dropped += 1;
                    continue;
                }
                Err(err) => return Err(self.fail(err)),
            };

            let passes = transformation
                .gate_output(&object, &group.fixation)
                .map_err(|err| {
                    let mut err = TransformationError::new(err, RunState::Emitting).with_record(&object);
                    if let Some(predicate) = &transformation.out_predicate {
                        err = err.with_argument(predicate);
                    }
                    err
                });
            match passes {
                Ok(true) => {}
                Ok(false) => {
                    self.summary.filtered += 1;
                    continue;
                }
                Err(err) => return Err(self.fail(err)),
            }

            log::trace!("emit {object}");
            if let Err(err) = sink.write(object.clone()) {
                let err = TransformationError::new(write_failure(err), RunState::Emitting)
                    .with_record(&object);
                return Err(self.fail(err));
            }
            self.summary.emitted += 1;
        }

        if let Err(err) = sink.flush() {
            let err = TransformationError::new(write_failure(err), RunState::Emitting);
            return Err(self.fail(err));
        }

        self.enter(RunState::Done);
        log::info!("transformation done: {}", self.summary);
        Ok(self.summary)
    }

    /// Output object of one group, or `None` when a field is absent or mistyped
    fn build_object(
        &self,
        key: &GroupKey,
        fixation: &Fixation,
        partials: &PartialResults,
    ) -> Result<Option<Value>> {
        let fields = &self.transformation.fields;
        let mut object = ObjectValue::with_capacity(fields.len());
        let mut key_values = key.values().iter();

        for field in fields {
            let value = if field.aggregate {
                match self
                    .transformation
                    .evaluator
                    .evaluate_grouped(&field.argument, fixation, partials)
                {
                    Ok(result) => result.into_value(),
                    Err(err) if err.is_absorbable() => {
                        log::trace!("object of group {key} dropped, field {field}: {err}");
                        return Ok(None);
                    }
                    Err(err) => return Err(emitting_error(err, field, key)),
                }
            } else {
                match key_values.next() {
                    Some(value) => value.clone(),
                    None => {
                        let err = EvaluationError::malformed_specification(format!(
                            "group key {key} has no value for field '{}'",
                            field.name
                        ));
                        return Err(emitting_error(err, field, key));
                    }
                }
            };
            object.insert(field.name.clone(), value);
        }
        Ok(Some(Value::Object(object)))
    }
}

fn emitting_error(err: EvaluationError, field: &OutputField, key: &GroupKey) -> TransformationError {
    TransformationError::new(err, RunState::Emitting)
        .with_argument(field)
        .with_record(&Value::Sequence(key.values().to_vec()))
}

impl Transformation {
    /// Open both engines and run the transformation
    pub fn run(&self) -> Result<RunSummary> {
        let mut source = self
            .in_engine
            .open()
            .map_err(|err| TransformationError::new(read_failure(err), RunState::Idle))?;
        let mut sink = self
            .out_engine
            .open()
            .map_err(|err| TransformationError::new(write_failure(err), RunState::Idle))?;
        self.run_with(source.as_mut(), sink.as_mut())
    }

    /// Run over caller-supplied engine handles
    pub fn run_with(&self, source: &mut dyn RecordSource, sink: &mut dyn RecordSink) -> Result<RunSummary> {
        log::debug!("running transformation\n{self}");
        let mut run = Run::new(self);
        if let Err(err) = run.consume(source) {
            return Err(run.fail(err));
        }
        run.emit(sink)
    }

    /// Run over several partitions of the input in parallel
    ///
    /// Each worker thread folds its partitions into a private group table.
    /// The tables are merged once every worker is done and the merged groups
    /// are emitted as in a sequential run.
    pub fn run_partitioned(
        &self,
        partitions: Vec<Box<dyn RecordSource + Send>>,
        sink: &mut dyn RecordSink,
    ) -> Result<RunSummary> {
        let workers = self.config.worker_threads(partitions.len());
        log::debug!(
            "running transformation over {} partitions on {workers} threads\n{self}",
            partitions.len()
        );

        let mut batches: Vec<Vec<Box<dyn RecordSource + Send>>> = (0..workers).map(|_| Vec::new()).collect();
        for (i, partition) in partitions.into_iter().enumerate() {
            batches[i % workers].push(partition);
        }

        let outcomes: Vec<Result<(GroupTable, RunSummary)>> = std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .into_iter()
                .map(|batch| {
                    scope.spawn(move || {
                        let mut run = Run::new(self);
                        for mut source in batch {
                            if let Err(err) = run.consume(source.as_mut()) {
                                return Err(run.fail(err));
                            }
                        }
                        Ok((run.table, run.summary))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        });

        let mut run = Run::new(self);
        log::debug!("partition barrier reached by {} workers", outcomes.len());
        for outcome in outcomes {
            let (table, summary) = outcome?;
            run.summary.add_partition(&summary);
            if let Err(err) = run.table.absorb(table) {
                let err = TransformationError::new(err, RunState::Grouping);
                return Err(run.fail(err));
            }
        }
        run.emit(sink)
    }
}
