//! Shared fixtures for integration tests

#![allow(dead_code)]

use notaql::engines::EngineResult;
use notaql::{
    Argument, EngineError, MemoryInput, MemoryOutput, RecordSink, RecordSource, Transformation,
    TransformationBuilder, Value,
};
use serde_json::json;

/// Route `log` output through env_logger, honouring `RUST_LOG`
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Convert a JSON array into input records
pub fn records(json: serde_json::Value) -> Vec<Value> {
    match json {
        serde_json::Value::Array(items) => items.into_iter().map(Value::from).collect(),
        other => panic!("expected a JSON array, got {other}"),
    }
}

/// The three-record `a`/`b` data set
pub fn abc_records() -> Vec<Value> {
    records(json!([
        {"a": 1, "b": "x"},
        {"a": 2, "b": "x"},
        {"a": 3, "b": "y"}
    ]))
}

/// `OUT.b <- IN.b, OUT.sum <- SUM(IN.a)` over the given input
pub fn sum_by_b(input: MemoryInput, output: MemoryOutput) -> TransformationBuilder {
    Transformation::builder(input, output)
        .field("b", Argument::field("IN.b"))
        .field("sum", Argument::aggregate("SUM", vec![Argument::field("IN.a")]))
}

/// Sort emitted objects by their rendering so multisets compare equal
pub fn sorted(mut values: Vec<Value>) -> Vec<Value> {
    values.sort_by_key(|v| v.to_string());
    values
}

/// Source that yields its records and then fails instead of ending
pub struct FailingSource {
    pub records: Vec<Value>,
}

impl RecordSource for FailingSource {
    fn next_record(&mut self) -> EngineResult<Option<Value>> {
        if self.records.is_empty() {
            return Err(EngineError::Read {
                message: "connection reset".to_string(),
            });
        }
        Ok(Some(self.records.remove(0)))
    }
}

/// Sink that accepts nothing
pub struct RejectingSink;

impl RecordSink for RejectingSink {
    fn write(&mut self, _record: Value) -> EngineResult<()> {
        Err(EngineError::Write {
            message: "disk full".to_string(),
        })
    }
}

/// Sink whose writes succeed but whose flush fails
#[derive(Default)]
pub struct UnflushableSink {
    pub written: Vec<Value>,
}

impl RecordSink for UnflushableSink {
    fn write(&mut self, record: Value) -> EngineResult<()> {
        self.written.push(record);
        Ok(())
    }

    fn flush(&mut self) -> EngineResult<()> {
        Err(EngineError::Write {
            message: "flush rejected".to_string(),
        })
    }
}
