use crate::split::config::SplitConfig;
use crate::split::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Severity};
use crate::split::error::{ConfigError, SplitError};
use crate::split::types::{type_name, Blank, Disposition, Record, SplitOutcome, SplitStatus};
use serde_json::Value;

/// Splits one aggregate record into one record per element of a nested array.
///
/// Holds nothing but its validated config, so a single splitter can be shared
/// freely between threads.
#[derive(Debug, Clone)]
pub struct JsonSplitter {
    config: SplitConfig,
}

impl JsonSplitter {
    /// Build a splitter, rejecting an empty key path or empty keys
    pub fn new(config: SplitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(JsonSplitter { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split a record, collecting every diagnostic into the outcome
    pub fn split(&self, record: Record) -> SplitOutcome {
        let mut diagnostics = Vec::new();
        let mut outcome = self.split_with(record, &mut diagnostics);
        outcome.diagnostics = diagnostics;
        outcome
    }

    /// Split a record, streaming diagnostics into `sink`.
    ///
    /// The returned outcome has no diagnostics of its own; they all went to
    /// the sink. The input record is consumed whatever happens.
    pub fn split_with<S>(&self, mut record: Record, sink: &mut S) -> SplitOutcome
    where
        S: DiagnosticSink + ?Sized,
    {
        let Some((first, rest)) = self.config.keys.split_first() else {
            unreachable!("JsonSplitter::new rejects an empty key path");
        };

        // The top-level field goes away no matter what it holds.
        let mut events = record.shift_remove(first).unwrap_or(Value::Null);

        for key in rest {
            events = match events {
                Value::Object(mut obj) => obj.remove(key).unwrap_or(Value::Null),
                other => {
                    let err = SplitError::TraversalType {
                        type_name: type_name(&other),
                        key: key.clone(),
                    };
                    let kind = DiagnosticKind::TraversalType {
                        type_name: type_name(&other),
                        key: key.clone(),
                        events: other,
                    };
                    self.report(sink, &record, kind);
                    return Self::finish(Vec::new(), SplitStatus::Aborted(err));
                }
            };
        }

        match events {
            Value::Null => {
                self.report(sink, &record, DiagnosticKind::NullEvents);
                Self::finish(Vec::new(), SplitStatus::NullEvents)
            }
            Value::Array(items) if items.is_empty() => {
                self.report(sink, &record, DiagnosticKind::EmptyEvents);
                Self::finish(Vec::new(), SplitStatus::EmptyEvents)
            }
            Value::Array(items) => {
                let (records, skipped) = self.fan_out(&record, items, sink);
                let emitted = records.len();
                Self::finish(records, SplitStatus::Split { emitted, skipped })
            }
            other => {
                let repr = other.to_string();
                let err = SplitError::ExpectedArray {
                    type_name: type_name(&other),
                    repr: repr.clone(),
                };
                let kind = DiagnosticKind::ExpectedArray {
                    type_name: type_name(&other),
                    repr,
                    events: other,
                };
                self.report(sink, &record, kind);
                Self::finish(Vec::new(), SplitStatus::Aborted(err))
            }
        }
    }

    /// Build one record per non-blank element, returning them with the blank count
    fn fan_out<S>(&self, master: &Record, items: Vec<Value>, sink: &mut S) -> (Vec<Record>, usize)
    where
        S: DiagnosticSink + ?Sized,
    {
        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0;

        for (index, payload) in items.into_iter().enumerate() {
            if payload.is_blank() {
                skipped += 1;
                self.report(
                    sink,
                    master,
                    DiagnosticKind::EmptyElement { index, event_payload: payload },
                );
                continue;
            }

            let mut event = master.clone();
            event.insert(self.config.target.clone(), payload);

            if sink.enabled(Severity::Debug) {
                let event_payload = event.get(&self.config.target).cloned().unwrap_or_default();
                self.report(
                    sink,
                    master,
                    DiagnosticKind::Stashed { index, event_payload, event: event.clone() },
                );
            }

            records.push(event);
        }

        (records, skipped)
    }

    fn report<S>(&self, sink: &mut S, master: &Record, kind: DiagnosticKind)
    where
        S: DiagnosticSink + ?Sized,
    {
        if !sink.enabled(kind.severity()) {
            return;
        }

        sink.emit(Diagnostic {
            kind,
            keys: self.config.keys.clone(),
            target: self.config.target.clone(),
            master_event: master.clone(),
        });
    }

    fn finish(records: Vec<Record>, status: SplitStatus) -> SplitOutcome {
        SplitOutcome {
            records,
            status,
            disposition: Disposition::Cancelled,
            diagnostics: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::diagnostic::{CountingSink, NullSink};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(obj) => obj,
            other => panic!("fixture must be an object, got {}", other),
        }
    }

    fn default_splitter() -> JsonSplitter {
        JsonSplitter::new(SplitConfig::default()).unwrap()
    }

    fn nested_splitter() -> JsonSplitter {
        JsonSplitter::new(SplitConfig::default().with_keys(["body", "events"])).unwrap()
    }

    fn severities(outcome: &SplitOutcome) -> Vec<Severity> {
        outcome.diagnostics.iter().map(Diagnostic::severity).collect()
    }

    #[test]
    fn test_splits_events_into_messages() {
        let outcome = default_splitter().split(record(json!({
            "events": ["first event", "second event"]
        })));

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(Value::Object(outcome.records[0].clone()), json!({"message": "first event"}));
        assert_eq!(Value::Object(outcome.records[1].clone()), json!({"message": "second event"}));
        assert_eq!(outcome.status, SplitStatus::Split { emitted: 2, skipped: 0 });
        assert_eq!(outcome.disposition, Disposition::Cancelled);
        assert_eq!(severities(&outcome), vec![Severity::Debug, Severity::Debug]);
    }

    #[test]
    fn test_retains_element_data_structures() {
        let outcome = default_splitter().split(record(json!({
            "events": [
                "A String",
                2,
                {"A": "Hash", "should": "remain"},
                ["An", "Array"]
            ]
        })));

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.records[0]["message"], json!("A String"));
        assert_eq!(outcome.records[1]["message"], json!(2));
        assert_eq!(outcome.records[2]["message"], json!({"A": "Hash", "should": "remain"}));
        assert_eq!(outcome.records[3]["message"], json!(["An", "Array"]));
    }

    #[test]
    fn test_discards_original_events() {
        let outcome = default_splitter().split(record(json!({
            "events": ["event 1", "event 2"]
        })));

        for event in &outcome.records {
            assert!(!event.contains_key("events"));
        }
    }

    #[test]
    fn test_retains_sibling_fields_in_order() {
        let outcome = default_splitter().split(record(json!({
            "id": "123",
            "events": ["event 1", "event 2"],
            "meta": "common meta data",
            "common": {"more": ["common", "data"]}
        })));

        assert_eq!(outcome.records.len(), 2);
        for (event, expected) in outcome.records.iter().zip(["event 1", "event 2"]) {
            assert_eq!(event["message"], json!(expected));
            assert_eq!(event["meta"], json!("common meta data"));
            assert_eq!(event["common"], json!({"more": ["common", "data"]}));

            let keys: Vec<&str> = event.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["id", "meta", "common", "message"]);
        }
    }

    #[test]
    fn test_derived_records_are_independent() {
        let outcome = default_splitter().split(record(json!({
            "events": ["a", "b"],
            "shared": {"n": 1}
        })));

        let mut records = outcome.records;
        records[0].insert(String::from("shared"), json!("changed"));
        assert_eq!(records[1]["shared"], json!({"n": 1}));
    }

    #[test]
    fn test_ignores_empty_event_array() {
        let outcome = default_splitter().split(record(json!({"events": []})));

        assert!(outcome.is_empty());
        assert_eq!(outcome.status, SplitStatus::EmptyEvents);
        assert_eq!(outcome.disposition, Disposition::Cancelled);
        assert_eq!(severities(&outcome), vec![Severity::Info]);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::EmptyEvents);
    }

    #[test]
    fn test_ignores_empty_event_contents() {
        let outcome = default_splitter().split(record(json!({
            "events": ["event 1", "event 2", "", null, [], {}]
        })));

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0]["message"], json!("event 1"));
        assert_eq!(outcome.records[1]["message"], json!("event 2"));
        assert_eq!(outcome.status, SplitStatus::Split { emitted: 2, skipped: 4 });

        let skipped: Vec<usize> = outcome
            .diagnostics
            .iter()
            .filter_map(|d| match d.kind {
                DiagnosticKind::EmptyElement { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec![2, 3, 4, 5]);
        assert_eq!(outcome.diagnostics[2].message(), "Event 3 is empty");
    }

    #[test]
    fn test_false_is_skipped_but_zero_is_kept() {
        let outcome = default_splitter().split(record(json!({
            "events": [false, 0, true, 0.0]
        })));

        let messages: Vec<&Value> = outcome.records.iter().map(|r| &r["message"]).collect();
        assert_eq!(messages, vec![&json!(0), &json!(true), &json!(0.0)]);
        assert_eq!(outcome.status, SplitStatus::Split { emitted: 3, skipped: 1 });
    }

    #[test]
    fn test_null_events_warns() {
        let outcome = default_splitter().split(record(json!({"other": 1})));

        assert!(outcome.is_empty());
        assert_eq!(outcome.status, SplitStatus::NullEvents);
        assert_eq!(severities(&outcome), vec![Severity::Warn]);
        assert_eq!(outcome.diagnostics[0].master_event, record(json!({"other": 1})));

        let outcome = default_splitter().split(record(json!({"events": null})));
        assert_eq!(outcome.status, SplitStatus::NullEvents);
    }

    #[test]
    fn test_non_array_events_is_an_error() {
        let outcome = default_splitter().split(record(json!({"events": "Not an Array"})));

        assert!(outcome.is_empty());
        assert!(outcome.status.is_error());
        assert_eq!(
            outcome.status.error(),
            Some(&SplitError::ExpectedArray {
                type_name: "String",
                repr: String::from("\"Not an Array\""),
            })
        );
        assert_eq!(outcome.disposition, Disposition::Cancelled);
        assert_eq!(severities(&outcome), vec![Severity::Error]);
        assert_eq!(outcome.diagnostics[0].value(), &json!("Not an Array"));
        assert_eq!(
            outcome.diagnostics[0].message(),
            "Filtered input should be an Array but is instead: String (\"Not an Array\")."
        );
    }

    #[test]
    fn test_object_events_is_an_error() {
        let outcome = default_splitter().split(record(json!({"events": {"a": 1}})));
        assert!(matches!(
            outcome.status,
            SplitStatus::Aborted(SplitError::ExpectedArray { type_name: "Object", .. })
        ));
    }

    #[test]
    fn test_nested_keys_split() {
        let outcome = nested_splitter().split(record(json!({
            "body": {"events": ["e1", "e2"]},
            "meta": "x"
        })));

        assert_eq!(outcome.records.len(), 2);
        for (event, expected) in outcome.records.iter().zip(["e1", "e2"]) {
            assert_eq!(Value::Object(event.clone()), json!({"meta": "x", "message": expected}));
            assert!(!event.contains_key("body"));
        }
    }

    #[test]
    fn test_nested_keys_discard_whole_top_level_key() {
        let outcome = nested_splitter().split(record(json!({
            "body": {"events": ["event 1"], "other": "dropped too"}
        })));

        assert_eq!(outcome.records.len(), 1);
        assert!(!outcome.records[0].contains_key("body"));
        assert!(!outcome.records[0].contains_key("other"));
    }

    #[test]
    fn test_inner_nesting_not_an_object_is_an_error() {
        let outcome = nested_splitter().split(record(json!({"body": "Not a Hash"})));

        assert!(outcome.is_empty());
        assert_eq!(
            outcome.status,
            SplitStatus::Aborted(SplitError::TraversalType {
                type_name: "String",
                key: String::from("events"),
            })
        );
        assert_eq!(severities(&outcome), vec![Severity::Error]);
        assert_eq!(outcome.disposition, Disposition::Cancelled);
    }

    #[test]
    fn test_missing_intermediate_key_is_an_error() {
        let outcome = nested_splitter().split(record(json!({"meta": "x"})));
        assert!(matches!(
            outcome.status,
            SplitStatus::Aborted(SplitError::TraversalType { type_name: "Null", .. })
        ));
    }

    #[test]
    fn test_missing_terminal_key_warns() {
        let outcome = nested_splitter().split(record(json!({"body": {"other": []}})));
        assert_eq!(outcome.status, SplitStatus::NullEvents);
    }

    #[test]
    fn test_custom_target() {
        let splitter = JsonSplitter::new(SplitConfig::default().with_target("event")).unwrap();
        let outcome = splitter.split(record(json!({
            "events": ["first event", "second event"]
        })));

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0]["event"], json!("first event"));
        assert_eq!(outcome.records[1]["event"], json!("second event"));
        assert!(outcome.records.iter().all(|r| !r.contains_key("message")));
    }

    #[test]
    fn test_target_overwrites_existing_field() {
        let outcome = default_splitter().split(record(json!({
            "message": "aggregate",
            "events": ["one"]
        })));
        assert_eq!(outcome.records[0]["message"], json!("one"));
        assert_eq!(outcome.records[0].len(), 1);
    }

    #[test]
    fn test_config_is_kept_as_given() {
        let config = SplitConfig::new(["body", "events"], "event");
        let splitter = JsonSplitter::new(config.clone()).unwrap();
        assert_eq!(splitter.config(), &config);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert_eq!(
            JsonSplitter::new(SplitConfig::default().with_keys(Vec::<String>::new())).unwrap_err(),
            ConfigError::EmptyKeys
        );
        assert!(JsonSplitter::new(SplitConfig::new(["body", ""], "message")).is_err());
    }

    #[test]
    fn test_split_with_skips_unwanted_diagnostics() {
        let splitter = default_splitter();
        let mut sink = CountingSink::new(NullSink);

        let outcome = splitter.split_with(
            record(json!({"events": ["a", "", "b"]})),
            &mut sink,
        );

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(sink.count(Severity::Info), 1);
        assert_eq!(sink.count(Severity::Debug), 0);
    }

    #[test]
    fn test_stashed_diagnostic_carries_derived_record() {
        let outcome = default_splitter().split(record(json!({
            "events": ["a"],
            "meta": 1
        })));

        match &outcome.diagnostics[0].kind {
            DiagnosticKind::Stashed { index, event_payload, event } => {
                assert_eq!(*index, 0);
                assert_eq!(event_payload, &json!("a"));
                assert_eq!(event, &outcome.records[0]);
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
        assert_eq!(outcome.diagnostics[0].master_event, record(json!({"meta": 1})));
    }

    #[test]
    fn test_shared_across_threads() {
        let splitter = default_splitter();

        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|n| {
                    let splitter = &splitter;
                    scope.spawn(move || {
                        let events: Vec<Value> = (0..=n).map(|i| json!(i)).collect();
                        splitter.split(record(json!({"events": events}))).len()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counts, vec![1, 2, 3, 4]);
    }
}
