//! Core value types for NotaQL transformations

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::types::ValueKind;
use crate::evaluator::{EvaluationError, EvaluationResult};

/// Core value type exchanged between engines, fixations and the evaluator
///
/// Values are schema-less: scalars, objects with named fields and ordered sequences.
/// A value is never modified after it has been handed to the evaluator; every
/// operation that "updates" a value builds a new one.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null scalar
    Null,

    /// Boolean scalar
    Boolean(bool),

    /// Integer scalar (64-bit signed)
    Integer(i64),

    /// Floating point scalar
    Float(f64),

    /// String scalar
    String(String),

    /// Raw bytes
    Binary(Vec<u8>),

    /// Point in time, normalized to UTC
    Timestamp(DateTime<Utc>),

    /// Object with uniquely named fields in insertion order
    Object(ObjectValue),

    /// Ordered sequence of values
    Sequence(Vec<Value>),
}

/// Object value: field name to value, insertion ordered, looked up by name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectValue(IndexMap<String, Value>);

impl ObjectValue {
    /// Create an empty object
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Create an empty object with room for `capacity` fields
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Insert a field, replacing (in place) any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Check whether a field exists
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the object has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in insertion order
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterate over field names in insertion order
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Take ownership of the inner map
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

// Field order does not take part in equality, so the hash must not depend on it either.
impl Hash for ObjectValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut combined: u64 = 0;
        for (name, value) in &self.0 {
            let mut entry = FxHasher::default();
            name.hash(&mut entry);
            value.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        self.0.len().hash(state);
        combined.hash(state);
    }
}

impl FromIterator<(String, Value)> for ObjectValue {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ObjectValue {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectValue {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Binary(_) => ValueKind::Binary,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Object(_) => ValueKind::Object,
            Self::Sequence(_) => ValueKind::Sequence,
        }
    }

    /// Check if the value is a scalar (neither object nor sequence)
    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content widened to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean content
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as object
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow as sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Navigate into a named field
    pub fn get_field(&self, name: &str) -> EvaluationResult<&Value> {
        match self {
            Self::Object(fields) => fields
                .get(name)
                .ok_or_else(|| EvaluationError::path_not_found(name)),
            other => Err(EvaluationError::type_mismatch(
                format!("Object to read field '{name}'"),
                other.kind(),
            )),
        }
    }

    /// Navigate into a sequence element
    pub fn get_index(&self, index: usize) -> EvaluationResult<&Value> {
        match self {
            Self::Sequence(items) => items
                .get(index)
                .ok_or_else(|| EvaluationError::path_not_found(format!("[{index}]"))),
            other => Err(EvaluationError::type_mismatch(
                format!("Sequence to read index {index}"),
                other.kind(),
            )),
        }
    }

    /// Ordering used by the comparison operators
    ///
    /// Defined for numbers (integer and float widen to each other), strings,
    /// timestamps and binaries. Any other pairing is a type mismatch. Numbers
    /// follow IEEE ordering: `-0.0` and `0.0` are equal and NaN is unordered,
    /// which is reported as a type mismatch.
    pub fn compare(&self, other: &Value) -> EvaluationResult<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Ok(a.cmp(b)),
            (Self::Integer(a), Self::Float(b)) => numeric_order(*a as f64, *b),
            (Self::Float(a), Self::Integer(b)) => numeric_order(*a, *b as f64),
            (Self::Float(a), Self::Float(b)) => numeric_order(*a, *b),
            (Self::String(a), Self::String(b)) => Ok(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Ok(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Ok(a.cmp(b)),
            (left, right) => Err(EvaluationError::type_mismatch(
                format!("value ordered against {}", left.kind()),
                right.kind(),
            )),
        }
    }

    /// Equality used by `=` and `!=`
    ///
    /// Numbers widen, null is unequal to everything but null, every other kind
    /// only compares with its own kind. NaN is unequal to every number, itself
    /// included.
    pub fn equals(&self, other: &Value) -> EvaluationResult<bool> {
        match (self, other) {
            (Self::Null, right) => Ok(right.is_null()),
            (_, Self::Null) => Ok(false),
            (left, right) if left.kind().is_numeric() && right.kind().is_numeric() => {
                Ok(left.compare(right).is_ok_and(|ordering| ordering == Ordering::Equal))
            }
            (left, right) if left.kind() == right.kind() => Ok(left == right),
            (left, right) => Err(EvaluationError::type_mismatch(
                format!("value comparable with {}", left.kind()),
                right.kind(),
            )),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::Binary(_) => 4,
            Self::Timestamp(_) => 5,
            Self::Sequence(_) => 6,
            Self::Object(_) => 7,
        }
    }

    /// Total order over all values, consistent with structural equality
    ///
    /// Only used to give set-like results a deterministic layout.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            // integers sort before floats of the same magnitude
            (Self::Integer(a), Self::Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Self::Float(a), Self::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Binary(a), Self::Binary(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Sequence(a), Self::Sequence(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.canonical_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Self::Object(a), Self::Object(b)) => {
                let mut left: Vec<_> = a.iter().collect();
                let mut right: Vec<_> = b.iter().collect();
                left.sort_by(|x, y| x.0.cmp(y.0));
                right.sort_by(|x, y| x.0.cmp(y.0));
                for ((ka, va), (kb, vb)) in left.iter().zip(right.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.canonical_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                left.len().cmp(&right.len())
            }
            (left, right) => left.kind_rank().cmp(&right.kind_rank()),
        }
    }

    /// Addition with integer/float widening
    pub fn checked_add(&self, other: &Value) -> EvaluationResult<Value> {
        numeric_op("ADD", self, other, i64::checked_add, |a, b| a + b)
    }

    /// Subtraction with integer/float widening
    pub fn checked_sub(&self, other: &Value) -> EvaluationResult<Value> {
        numeric_op("SUB", self, other, i64::checked_sub, |a, b| a - b)
    }

    /// Multiplication with integer/float widening
    pub fn checked_mul(&self, other: &Value) -> EvaluationResult<Value> {
        numeric_op("MUL", self, other, i64::checked_mul, |a, b| a * b)
    }

    /// Division with integer/float widening; integer division truncates
    pub fn checked_div(&self, other: &Value) -> EvaluationResult<Value> {
        if matches!(other, Self::Integer(0)) || matches!(other, Self::Float(f) if *f == 0.0) {
            return Err(EvaluationError::function_failed("DIV", "division by zero"));
        }
        numeric_op("DIV", self, other, i64::checked_div, |a, b| a / b)
    }

    /// Convert into the JSON representation used by engines
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Binary(bytes) => serde_json::Value::String(BASE64.encode(bytes)),
            Self::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

fn numeric_op(
    name: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvaluationResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => int_op(*a, *b)
            .map(Value::Integer)
            .ok_or_else(|| EvaluationError::function_failed(name, "integer overflow")),
        (l, r) => match (l.as_float(), r.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            (None, _) => Err(EvaluationError::type_mismatch(ValueKind::Number, l.kind())),
            (_, None) => Err(EvaluationError::type_mismatch(ValueKind::Number, r.kind())),
        },
    }
}

fn numeric_order(left: f64, right: f64) -> EvaluationResult<Ordering> {
    left.partial_cmp(&right)
        .ok_or_else(|| EvaluationError::type_mismatch("a number other than NaN", "NaN"))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Boolean(b) => b.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Binary(bytes) => bytes.hash(state),
            Self::Timestamp(ts) => ts.hash(state),
            Self::Object(fields) => fields.hash(state),
            Self::Sequence(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Binary(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            Self::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Object(fields) => fields.serialize(serializer),
            Self::Sequence(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<ObjectValue> for Value {
    fn from(object: ObjectValue) -> Self {
        Self::Object(object)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}
