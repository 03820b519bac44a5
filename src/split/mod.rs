//! Nested JSON splitting - fan one aggregate record out into many
//!
//! A `JsonSplitter` follows a path of keys into a record, expects an array
//! there, and produces one record per element. Each derived record keeps the
//! sibling fields of the original and stores the element under the target
//! field. The aggregate record itself is always consumed.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod splitter;
pub mod types;
pub mod writer;

pub use config::SplitConfig;
pub use diagnostic::{CountingSink, Diagnostic, DiagnosticKind, DiagnosticSink, NullSink, Severity, TracingSink};
pub use error::{ConfigError, SplitError};
pub use splitter::JsonSplitter;
pub use types::{type_name, Blank, Disposition, Record, SplitOutcome, SplitStatus};
pub use writer::RecordWriter;
