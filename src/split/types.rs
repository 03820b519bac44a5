use crate::split::diagnostic::Diagnostic;
use crate::split::error::SplitError;
use serde_json::{Map, Value};

/// One unit of data flowing through the pipeline: an ordered JSON object
pub type Record = Map<String, Value>;

/// What happens to the aggregate input record after a split.
///
/// Every invocation consumes its input, whatever the outcome, so the host
/// must never forward the aggregate form downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The aggregate record is dropped
    Cancelled,
}

/// How a single `split` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum SplitStatus {
    /// The array was found and fanned out (possibly every element was blank)
    Split { emitted: usize, skipped: usize },

    /// Nothing was found at the end of the key path
    NullEvents,

    /// An empty array was found at the end of the key path
    EmptyEvents,

    /// The record could not be split
    Aborted(SplitError),
}

impl SplitStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SplitStatus::Aborted(_))
    }

    pub fn error(&self) -> Option<&SplitError> {
        match self {
            SplitStatus::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

/// Everything a `split` call hands back to its host
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Derived records, in the order of their source elements
    pub records: Vec<Record>,

    pub status: SplitStatus,

    /// Always `Disposition::Cancelled`
    pub disposition: Disposition,

    pub diagnostics: Vec<Diagnostic>,
}

impl SplitOutcome {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Emptiness test used to drop blank array elements.
///
/// Containers and strings are blank when they have no content; scalars are
/// blank when falsy, which for JSON means `null` and `false` only.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(_) => false,
            Value::String(s) => s.is_empty(),
            Value::Array(arr) => arr.is_empty(),
            Value::Object(obj) => obj.is_empty(),
        }
    }
}

/// Runtime type name of a JSON value, as reported in diagnostics
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}
