//! TIMESTAMP() function

use crate::model::{Value, ValueKind};
use crate::registry::function::{FunctionError, FunctionResult, ScalarFunction};
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use chrono::{DateTime, Utc};

/// TIMESTAMP() function - parses an RFC 3339 string or interprets an
/// integer as milliseconds since the Unix epoch
pub struct TimestampFunction;

impl ScalarFunction for TimestampFunction {
    fn name(&self) -> &str {
        "TIMESTAMP"
    }

    fn signatures(&self) -> &[FunctionSignature] {
        static SIGS: std::sync::LazyLock<Vec<FunctionSignature>> = std::sync::LazyLock::new(|| {
            vec![
                FunctionSignature::new(
                    "TIMESTAMP",
                    vec![ParameterInfo::required("text", ValueKind::String)],
                    ValueKind::Timestamp,
                ),
                FunctionSignature::new(
                    "TIMESTAMP",
                    vec![ParameterInfo::required("epoch_millis", ValueKind::Integer)],
                    ValueKind::Timestamp,
                ),
            ]
        });
        &SIGS
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        match &args[0] {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| FunctionError::failed("TIMESTAMP", format!("'{s}': {e}"))),
            Value::Integer(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .map(Value::Timestamp)
                .ok_or_else(|| {
                    FunctionError::failed("TIMESTAMP", format!("{millis} ms is out of range"))
                }),
            other => Err(FunctionError::InvalidArgumentType {
                name: self.name().to_string(),
                index: 0,
                expected: "String or Integer".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}
