//! # nested-split - fan nested JSON arrays out into individual records
//!
//! Takes an aggregate record such as
//!
//! ```json
//! {"requestId": "123", "body": {"events": [{"id": "456"}, {"id": "789"}]}}
//! ```
//!
//! and turns it into one record per array element, keeping the sibling
//! fields and dropping the field that held the array:
//!
//! ```json
//! {"requestId": "123", "event": {"id": "456"}}
//! {"requestId": "123", "event": {"id": "789"}}
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use nested_split::{JsonSplitter, SplitConfig, SplitStatus};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SplitConfig::new(["body", "events"], "event");
//! let splitter = JsonSplitter::new(config)?;
//!
//! let record = serde_json::from_value(json!({
//!     "requestId": "123",
//!     "body": {"events": [{"id": "456"}, {"id": "789"}]}
//! }))?;
//!
//! let outcome = splitter.split(record);
//! assert_eq!(outcome.records.len(), 2);
//! assert_eq!(outcome.records[0]["event"], json!({"id": "456"}));
//! assert_eq!(outcome.status, SplitStatus::Split { emitted: 2, skipped: 0 });
//! # Ok(())
//! # }
//! ```
//!
//! Per-record problems (a non-object along the path, a non-array at its end)
//! never surface as `Err`: they are reported in `SplitOutcome::status` and as
//! error diagnostics, and the host moves on to the next record.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::{BufRead, Read, Write};

pub mod split;

pub use split::{
    ConfigError, Diagnostic, DiagnosticKind, DiagnosticSink, Disposition, JsonSplitter, Record,
    RecordWriter, Severity, SplitConfig, SplitError, SplitOutcome, SplitStatus, TracingSink,
};

/// Running totals for a stream of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub records_in: usize,
    pub records_out: usize,
    pub aborted: usize,
    pub null_events: usize,
    pub empty_events: usize,
    pub skipped_elements: usize,
}

impl SplitStats {
    pub fn record(&mut self, outcome: &SplitOutcome) {
        self.records_in += 1;
        self.records_out += outcome.records.len();
        match &outcome.status {
            SplitStatus::Split { skipped, .. } => self.skipped_elements += skipped,
            SplitStatus::NullEvents => self.null_events += 1,
            SplitStatus::EmptyEvents => self.empty_events += 1,
            SplitStatus::Aborted(_) => self.aborted += 1,
        }
    }
}

/// Split one parsed JSON value and write the results.
///
/// The value must be an object; anything else is an input error rather than
/// a split failure.
pub fn split_value<W: Write, S: DiagnosticSink + ?Sized>(
    value: Value,
    splitter: &JsonSplitter,
    writer: &mut RecordWriter<W>,
    sink: &mut S,
    stats: &mut SplitStats,
) -> Result<()> {
    let record = match value {
        Value::Object(record) => record,
        other => bail!("Expected a JSON object but got: {}", split::type_name(&other)),
    };

    let outcome = splitter.split_with(record, sink);
    stats.record(&outcome);
    writer.write_records(outcome.records)
}

/// Main entry point: split a newline-delimited JSON stream.
///
/// Diagnostics are logged through `tracing`; derived records are written in
/// input order.
pub fn split_json<R: BufRead, W: Write>(
    reader: R,
    writer: &mut RecordWriter<W>,
    splitter: &JsonSplitter,
) -> Result<SplitStats> {
    let mut stats = SplitStats::default();
    let mut sink = TracingSink;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }

        // SIMD parsing works in place on the line's own buffer
        let mut bytes = line.into_bytes();
        let value: Value = simd_json::serde::from_slice(&mut bytes)
            .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;

        split_value(value, splitter, writer, &mut sink, &mut stats)
            .with_context(|| format!("Invalid record on line {}", line_no + 1))?;
    }

    writer.flush()?;
    Ok(stats)
}

/// Split a whole JSON document.
///
/// The input may hold one object, a top-level array of objects, or several
/// whitespace-separated objects (NDJSON without `--ndjson`). Anything that is
/// not valid JSON, including trailing garbage after a value, is an error.
pub fn split_document<R: Read, W: Write>(
    reader: R,
    writer: &mut RecordWriter<W>,
    splitter: &JsonSplitter,
) -> Result<SplitStats> {
    let mut content = Vec::new();
    let mut buf_reader = std::io::BufReader::new(reader);
    buf_reader.read_to_end(&mut content).context("Failed to read input")?;

    let mut stats = SplitStats::default();
    let mut sink = TracingSink;

    let stream = serde_json::Deserializer::from_slice(&content).into_iter::<Value>();
    for (doc_no, document) in stream.enumerate() {
        let document = document
            .with_context(|| format!("Failed to parse JSON document {}", doc_no + 1))?;

        match document {
            Value::Array(items) => {
                for (idx, item) in items.into_iter().enumerate() {
                    split_value(item, splitter, writer, &mut sink, &mut stats).with_context(
                        || format!("Invalid record at index {} of document {}", idx, doc_no + 1),
                    )?;
                }
            }
            value => split_value(value, splitter, writer, &mut sink, &mut stats)
                .with_context(|| format!("Invalid record in document {}", doc_no + 1))?,
        }
    }

    if stats.records_in == 0 {
        tracing::warn!("Input contains no records");
    }

    writer.flush()?;
    Ok(stats)
}
