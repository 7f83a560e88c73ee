//! In-memory engines

use super::{EngineError, EngineResult, InputEngine, OutputEngine, RecordSink, RecordSource};
use crate::model::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Input engine over a fixed list of records
#[derive(Debug, Clone)]
pub struct MemoryInput {
    name: String,
    records: Arc<[Value]>,
}

impl MemoryInput {
    /// Create an input engine over `records`
    pub fn new(records: impl IntoIterator<Item = Value>) -> Self {
        Self::named("memory", records)
    }

    /// Create an input engine with a display name
    pub fn named(name: impl Into<String>, records: impl IntoIterator<Item = Value>) -> Self {
        Self {
            name: name.into(),
            records: records.into_iter().collect(),
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split the records round-robin into `count` independent sources
    pub fn partitions(&self, count: usize) -> Vec<Box<dyn RecordSource + Send>> {
        let count = count.max(1);
        (0..count)
            .map(|partition| {
                Box::new(MemorySource {
                    records: Arc::clone(&self.records),
                    position: partition,
                    stride: count,
                }) as Box<dyn RecordSource + Send>
            })
            .collect()
    }
}

impl fmt::Display for MemoryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} records)", self.name, self.records.len())
    }
}

impl InputEngine for MemoryInput {
    fn open(&self) -> EngineResult<Box<dyn RecordSource + Send>> {
        Ok(Box::new(MemorySource {
            records: Arc::clone(&self.records),
            position: 0,
            stride: 1,
        }))
    }
}

/// Source reading every `stride`-th record of a [`MemoryInput`]
#[derive(Debug)]
pub struct MemorySource {
    records: Arc<[Value]>,
    position: usize,
    stride: usize,
}

impl RecordSource for MemorySource {
    fn next_record(&mut self) -> EngineResult<Option<Value>> {
        let record = self.records.get(self.position).cloned();
        if record.is_some() {
            self.position += self.stride;
        }
        Ok(record)
    }
}

#[derive(Debug, Default)]
struct Collected {
    records: Vec<Value>,
    flushes: usize,
}

/// Output engine collecting written objects; shared between clones
#[derive(Debug, Clone)]
pub struct MemoryOutput {
    name: String,
    collected: Arc<Mutex<Collected>>,
    capacity: Option<usize>,
}

impl Default for MemoryOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOutput {
    /// Create an empty output engine
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create an output engine with a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collected: Arc::new(Mutex::new(Collected::default())),
            capacity: None,
        }
    }

    /// Refuse writes once `capacity` records have been accepted
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Snapshot of the written records, in write order
    pub fn records(&self) -> Vec<Value> {
        self.collected.lock().records.clone()
    }

    /// Remove and return the written records
    pub fn take(&self) -> Vec<Value> {
        std::mem::take(&mut self.collected.lock().records)
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        self.collected.lock().flushes
    }
}

impl fmt::Display for MemoryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl OutputEngine for MemoryOutput {
    fn open(&self) -> EngineResult<Box<dyn RecordSink + Send>> {
        Ok(Box::new(MemorySink {
            collected: Arc::clone(&self.collected),
            capacity: self.capacity,
        }))
    }
}

/// Sink appending to a [`MemoryOutput`]
#[derive(Debug)]
pub struct MemorySink {
    collected: Arc<Mutex<Collected>>,
    capacity: Option<usize>,
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: Value) -> EngineResult<()> {
        if !matches!(record, Value::Object(_)) {
            return Err(EngineError::Write {
                message: format!("expected an object, got {}", record.kind()),
            });
        }
        let mut collected = self.collected.lock();
        if self
            .capacity
            .is_some_and(|capacity| collected.records.len() >= capacity)
        {
            return Err(EngineError::Write {
                message: "capacity exhausted".to_string(),
            });
        }
        collected.records.push(record);
        Ok(())
    }

    fn flush(&mut self) -> EngineResult<()> {
        self.collected.lock().flushes += 1;
        Ok(())
    }
}
