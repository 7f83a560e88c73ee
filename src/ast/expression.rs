//! Argument tree node definitions

use crate::evaluator::EvaluationError;
use crate::model::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Node of a functional output argument tree
///
/// A tree is built once when the transformation is defined and evaluated
/// read-only against many fixations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// Constant value
    Literal(Value),

    /// Reference into the active fixation
    Path(PathReference),

    /// Scalar or aggregate function call (boxed for size optimization)
    Call(Box<FunctionCall>),

    /// Object built from named sub-arguments
    Object(ObjectConstructor),

    /// Sequence built from sub-arguments
    Sequence(Vec<Argument>),
}

/// One navigation step of a [`PathReference`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Named field (or, as first step, a binding name)
    Field(String),
    /// Sequence index
    Index(usize),
}

/// Path resolved against a fixation: the first step names a binding, the rest navigate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathReference {
    steps: SmallVec<[PathStep; 4]>,
}

/// Function call data (separate struct to optimize enum size)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name, matched case-insensitively
    pub name: String,
    /// Arguments in evaluation order
    pub args: Vec<Argument>,
    /// Whether the call is an aggregate over the output group
    #[serde(default)]
    pub aggregate: bool,
    /// Partial-result slot, numbered by the owning transformation
    #[serde(skip)]
    pub(crate) slot: usize,
}

/// Object constructor: named fields in author order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectConstructor {
    fields: Vec<(String, Argument)>,
}

impl Argument {
    /// Literal argument
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Path argument from dotted field names, e.g. `IN.address.city`
    pub fn field(dotted: &str) -> Self {
        Self::Path(PathReference::new(
            dotted.split('.').map(|s| PathStep::Field(s.to_string())),
        ))
    }

    /// Path argument
    pub fn path(path: PathReference) -> Self {
        Self::Path(path)
    }

    /// Scalar function call
    pub fn call(name: impl Into<String>, args: Vec<Argument>) -> Self {
        Self::Call(Box::new(FunctionCall::new(name, args, false)))
    }

    /// Aggregate function call
    pub fn aggregate(name: impl Into<String>, args: Vec<Argument>) -> Self {
        Self::Call(Box::new(FunctionCall::new(name, args, true)))
    }

    /// Object constructor argument
    pub fn object(object: ObjectConstructor) -> Self {
        Self::Object(object)
    }

    /// Sequence constructor argument
    pub fn sequence(items: Vec<Argument>) -> Self {
        Self::Sequence(items)
    }

    /// Check whether any aggregate call occurs in this tree
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Self::Literal(_) | Self::Path(_) => false,
            Self::Call(call) => call.aggregate || call.args.iter().any(Argument::contains_aggregate),
            Self::Object(object) => object.fields.iter().any(|(_, a)| a.contains_aggregate()),
            Self::Sequence(items) => items.iter().any(Argument::contains_aggregate),
        }
    }

    /// Height of the tree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        let children = match self {
            Self::Literal(_) | Self::Path(_) => 0,
            Self::Call(call) => call.args.iter().map(Argument::depth).max().unwrap_or(0),
            Self::Object(object) => object
                .fields
                .iter()
                .map(|(_, a)| a.depth())
                .max()
                .unwrap_or(0),
            Self::Sequence(items) => items.iter().map(Argument::depth).max().unwrap_or(0),
        };
        children + 1
    }

    /// Number aggregate calls in pre-order, starting at `next`; returns their function names
    pub(crate) fn assign_aggregate_slots(&mut self, next: &mut usize, names: &mut Vec<String>) {
        match self {
            Self::Literal(_) | Self::Path(_) => {}
            Self::Call(call) => {
                if call.aggregate {
                    call.slot = *next;
                    *next += 1;
                    names.push(call.name.clone());
                }
                for arg in &mut call.args {
                    arg.assign_aggregate_slots(next, names);
                }
            }
            Self::Object(object) => {
                for (_, arg) in &mut object.fields {
                    arg.assign_aggregate_slots(next, names);
                }
            }
            Self::Sequence(items) => {
                for item in items {
                    item.assign_aggregate_slots(next, names);
                }
            }
        }
    }
}

impl PathStep {
    /// Field step
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }
}

impl PathReference {
    /// Create a path from its steps
    pub fn new(steps: impl IntoIterator<Item = PathStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Path consisting of a single binding name
    pub fn binding(name: impl Into<String>) -> Self {
        Self::new([PathStep::Field(name.into())])
    }

    /// Append a field step
    pub fn then_field(mut self, name: impl Into<String>) -> Self {
        self.steps.push(PathStep::Field(name.into()));
        self
    }

    /// Append an index step
    pub fn then_index(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }

    /// All steps
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Binding name the path starts from
    pub fn root(&self) -> Option<&str> {
        match self.steps.first() {
            Some(PathStep::Field(name)) => Some(name),
            _ => None,
        }
    }

    /// Check if the path has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for PathReference {
    type Err = EvaluationError;

    /// Parse `IN.items[0].name` style paths
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || EvaluationError::malformed_specification(format!("invalid path '{s}'"));
        let mut steps = SmallVec::new();

        for segment in s.split('.') {
            let (name, mut rest) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };
            if name.is_empty() {
                return Err(malformed());
            }
            steps.push(PathStep::Field(name.to_string()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(malformed)?;
                let index = rest[1..close].parse::<usize>().map_err(|_| malformed())?;
                steps.push(PathStep::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(malformed());
                }
            }
        }

        Ok(Self { steps })
    }
}

impl FunctionCall {
    /// Create a call; the slot is assigned later by the owning transformation
    pub fn new(name: impl Into<String>, args: Vec<Argument>, aggregate: bool) -> Self {
        Self {
            name: name.into(),
            args,
            aggregate,
            slot: 0,
        }
    }

    /// Partial-result slot of an aggregate call
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl ObjectConstructor {
    /// Create an empty constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn with_field(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.fields.push((name.into(), argument));
        self
    }

    /// Append a field in place
    pub fn push(&mut self, name: impl Into<String>, argument: Argument) {
        self.fields.push((name.into(), argument));
    }

    /// Fields in author order
    pub fn fields(&self) -> &[(String, Argument)] {
        &self.fields
    }

    /// Look up a field's argument by name
    pub fn field(&self, name: &str) -> Option<&Argument> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, argument)| argument)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [(String, Argument)] {
        &mut self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Argument)> for ObjectConstructor {
    fn from_iter<T: IntoIterator<Item = (String, Argument)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<PathReference> for Argument {
    fn from(path: PathReference) -> Self {
        Self::Path(path)
    }
}

impl From<ObjectConstructor> for Argument {
    fn from(object: ObjectConstructor) -> Self {
        Self::Object(object)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Argument]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Path(path) => write!(f, "{path}"),
            Self::Call(call) => write!(f, "{call}"),
            Self::Object(object) => write!(f, "OBJECT({object})"),
            Self::Sequence(items) => {
                write!(f, "LIST(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for PathReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Field(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Field(name) => write!(f, ".{name}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args)?;
        write!(f, ")")
    }
}

impl fmt::Display for ObjectConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, argument)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} <- {argument}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        let argument = Argument::object(
            ObjectConstructor::new()
                .with_field("b", Argument::field("IN.b"))
                .with_field(
                    "sum",
                    Argument::aggregate("SUM", vec![Argument::field("IN.a")]),
                )
                .with_field(
                    "tags",
                    Argument::sequence(vec![Argument::literal("x"), Argument::literal(1)]),
                ),
        );
        assert_eq!(
            argument.to_string(),
            r#"OBJECT(b <- IN.b, sum <- SUM(IN.a), tags <- LIST("x", 1))"#
        );
    }

    #[test]
    fn test_parse_path() {
        let path: PathReference = "IN.items[0][2].name".parse().unwrap();
        assert_eq!(
            path.steps(),
            &[
                PathStep::field("IN"),
                PathStep::field("items"),
                PathStep::Index(0),
                PathStep::Index(2),
                PathStep::field("name"),
            ]
        );
        assert_eq!(path.to_string(), "IN.items[0][2].name");
        assert_eq!(path.root(), Some("IN"));

        for bad in ["", "IN..a", "IN.a[", "IN.a[x]", "IN.a[0]b", "[0]"] {
            assert_eq!(
                bad.parse::<PathReference>().unwrap_err().kind(),
                ErrorKind::MalformedSpecification,
                "{bad}"
            );
        }
    }

    #[test]
    fn test_aggregate_detection_and_slots() {
        let mut argument = Argument::object(
            ObjectConstructor::new()
                .with_field("k", Argument::field("IN.k"))
                .with_field(
                    "stats",
                    Argument::sequence(vec![
                        Argument::aggregate("MIN", vec![Argument::field("IN.v")]),
                        Argument::aggregate("MAX", vec![Argument::field("IN.v")]),
                    ]),
                ),
        );
        assert!(argument.contains_aggregate());
        assert!(!Argument::field("IN.k").contains_aggregate());

        let mut next = 0;
        let mut names = Vec::new();
        argument.assign_aggregate_slots(&mut next, &mut names);
        assert_eq!(next, 2);
        assert_eq!(names, vec!["MIN".to_string(), "MAX".to_string()]);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Argument::literal(1).depth(), 1);
        let nested = Argument::call(
            "UPPER",
            vec![Argument::call("CONCAT", vec![Argument::field("IN.a")])],
        );
        assert_eq!(nested.depth(), 3);
    }

    #[test]
    fn test_json_representation() {
        let argument = Argument::aggregate("SUM", vec![Argument::field("IN.a")]);
        let json = serde_json::to_value(&argument).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"call": {"name": "SUM", "args": [{"path": ["IN", "a"]}], "aggregate": true}})
        );
        let back: Argument = serde_json::from_value(json).unwrap();
        assert_eq!(back, argument);
    }
}
