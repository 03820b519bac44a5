//! Structured diagnostics produced while splitting.
//!
//! The splitter never formats or prints anything itself. It hands
//! `Diagnostic` values to a `DiagnosticSink`, and the host decides how they
//! are surfaced: collected, serialized, or logged through `TracingSink`.

use crate::split::error::SplitError;
use crate::split::types::Record;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// What happened. Element indices are 0-based here and 1-based in messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A value along the key path was not an object
    TraversalType {
        type_name: &'static str,
        key: String,
        events: Value,
    },

    /// The value at the end of the key path was not an array
    ExpectedArray {
        type_name: &'static str,
        repr: String,
        events: Value,
    },

    NullEvents,

    EmptyEvents,

    EmptyElement { index: usize, event_payload: Value },

    /// An element was stored into a derived record
    Stashed {
        index: usize,
        event_payload: Value,
        event: Record,
    },
}

/// A single severity-tagged signal, with enough context to debug the record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,

    pub keys: Vec<String>,

    pub target: String,

    /// The input record after the first key was removed from it
    pub master_event: Record,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// The value that triggered this diagnostic
    pub fn value(&self) -> &Value {
        match &self.kind {
            DiagnosticKind::TraversalType { events, .. }
            | DiagnosticKind::ExpectedArray { events, .. } => events,
            DiagnosticKind::NullEvents => &NULL,
            DiagnosticKind::EmptyEvents => &EMPTY_ARRAY,
            DiagnosticKind::EmptyElement { event_payload, .. }
            | DiagnosticKind::Stashed { event_payload, .. } => event_payload,
        }
    }

    /// The per-record error this diagnostic reports, if it is one
    pub fn error(&self) -> Option<SplitError> {
        match &self.kind {
            DiagnosticKind::TraversalType { type_name, key, .. } => {
                Some(SplitError::TraversalType { type_name: *type_name, key: key.clone() })
            }
            DiagnosticKind::ExpectedArray { type_name, repr, .. } => {
                Some(SplitError::ExpectedArray { type_name: *type_name, repr: repr.clone() })
            }
            _ => None,
        }
    }

    /// Human readable summary, without the structured context
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::TraversalType { .. } | DiagnosticKind::ExpectedArray { .. } => {
                self.error().map(|err| err.to_string()).unwrap_or_default()
            }
            DiagnosticKind::NullEvents => String::from("Filtered events are null"),
            DiagnosticKind::EmptyEvents => String::from("Filtered events are empty"),
            DiagnosticKind::EmptyElement { index, .. } => format!("Event {} is empty", index + 1),
            DiagnosticKind::Stashed { index, .. } => format!("Stashing event {}", index + 1),
        }
    }

    /// Render through `tracing` at the matching level
    pub fn log(&self) {
        let message = self.message();
        let keys = self.keys.join(".");
        let master_event = json_or_empty(&self.master_event);
        let value = json_or_empty(self.value());

        match self.severity() {
            Severity::Error => tracing::error!(
                keys = %keys,
                target_field = %self.target,
                events = %value,
                master_event = %master_event,
                "{}",
                message
            ),
            Severity::Warn => tracing::warn!(
                keys = %keys,
                target_field = %self.target,
                events = %value,
                master_event = %master_event,
                "{}",
                message
            ),
            Severity::Info => tracing::info!(
                keys = %keys,
                target_field = %self.target,
                events = %value,
                master_event = %master_event,
                "{}",
                message
            ),
            Severity::Debug => tracing::debug!(
                keys = %keys,
                target_field = %self.target,
                event_payload = %value,
                master_event = %master_event,
                "{}",
                message
            ),
        }
    }
}

static NULL: Value = Value::Null;
static EMPTY_ARRAY: Value = Value::Array(Vec::new());

fn json_or_empty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::TraversalType { .. } | DiagnosticKind::ExpectedArray { .. } => {
                Severity::Error
            }
            DiagnosticKind::NullEvents => Severity::Warn,
            DiagnosticKind::EmptyEvents | DiagnosticKind::EmptyElement { .. } => Severity::Info,
            DiagnosticKind::Stashed { .. } => Severity::Debug,
        }
    }
}

/// Receives diagnostics as a split runs
pub trait DiagnosticSink {
    /// Whether diagnostics of this severity will be used at all.
    ///
    /// The splitter skips building diagnostics the sink does not want.
    fn enabled(&self, _severity: Severity) -> bool {
        true
    }

    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Logs every diagnostic through `tracing` as it arrives
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn enabled(&self, severity: Severity) -> bool {
        match severity {
            Severity::Error => tracing::enabled!(tracing::Level::ERROR),
            Severity::Warn => tracing::enabled!(tracing::Level::WARN),
            Severity::Info => tracing::enabled!(tracing::Level::INFO),
            Severity::Debug => tracing::enabled!(tracing::Level::DEBUG),
        }
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
    }
}

/// Drops everything; for hosts that only care about the records
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn enabled(&self, _severity: Severity) -> bool {
        false
    }

    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

/// Wraps another sink and counts what passes through it
#[derive(Debug, Default)]
pub struct CountingSink<S> {
    inner: S,
    counts: [usize; 4],
}

impl<S: DiagnosticSink> CountingSink<S> {
    pub fn new(inner: S) -> Self {
        CountingSink { inner, counts: [0; 4] }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity as usize]
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for CountingSink<S> {
    fn enabled(&self, severity: Severity) -> bool {
        // Info and above are always counted, even when the inner sink drops them.
        severity >= Severity::Info || self.inner.enabled(severity)
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = diagnostic.severity();
        self.counts[severity as usize] += 1;
        if self.inner.enabled(severity) {
            self.inner.emit(diagnostic);
        }
    }
}
