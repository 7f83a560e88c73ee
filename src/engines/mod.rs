//! Engine handle contract
//!
//! Engines are the storage adapters on either side of a transformation. The
//! core only needs to pull records from an input handle and push objects into
//! an output handle; everything about the backing store stays behind these
//! traits.

#![warn(missing_docs)]

mod memory;

pub use memory::{MemoryInput, MemoryOutput, MemorySink, MemorySource};

use crate::model::Value;
use std::fmt;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by engine collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine could not open a handle
    #[error("Engine '{engine}' unavailable: {message}")]
    Unavailable {
        /// Engine description
        engine: String,
        /// Error message
        message: String,
    },

    /// Reading the next record failed
    #[error("Read failed: {message}")]
    Read {
        /// Error message
        message: String,
    },

    /// Writing or flushing failed
    #[error("Write failed: {message}")]
    Write {
        /// Error message
        message: String,
    },
}

/// Pull side of an input engine
pub trait RecordSource {
    /// Next raw record, or `None` once the input is exhausted
    fn next_record(&mut self) -> EngineResult<Option<Value>>;
}

/// Push side of an output engine
pub trait RecordSink {
    /// Hand one output object to the engine
    fn write(&mut self, record: Value) -> EngineResult<()>;

    /// Make everything written so far durable, as far as the engine supports it
    fn flush(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

/// Input engine: opens record sources for a run
pub trait InputEngine: fmt::Display + Send + Sync {
    /// Open a fresh source positioned at the first record
    fn open(&self) -> EngineResult<Box<dyn RecordSource + Send>>;
}

/// Output engine: opens record sinks for a run
pub trait OutputEngine: fmt::Display + Send + Sync {
    /// Open a sink
    fn open(&self) -> EngineResult<Box<dyn RecordSink + Send>>;
}
