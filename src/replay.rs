//! Replay of recorded error-event streams.
//!
//! Hosts dump the error events they fed the detector as JSON lines, one
//! event per line, optionally tagged with the task instance that produced
//! them. Replaying such a stream re-runs the detector offline: one reset
//! per instance, every suggestion re-derived, statistics rebuilt. This is
//! the audit path for the detector's logging contract.

use crate::classify::Classifier;
use crate::detector::ErrorDetector;
use crate::error::ReplayError;
use crate::event::{ErrorEvent, ErrorKind};
use crate::report::{FiredSuggestion, InstanceReport, ReplayReport};
use serde::Deserialize;
use std::io::BufRead;
use tracing::debug;

/// Instance label used for events that carry none.
pub const DEFAULT_INSTANCE: &str = "default";

/// One line of a recorded event stream.
///
/// `kind` may be omitted; the message is then classified with the builtin
/// pattern table, the same way a host-side extraction path would.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedEvent {
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub kind: Option<ErrorKind>,
    pub message: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub code_snippet: Option<String>,
}

impl RecordedEvent {
    fn into_event(self, classifier: &Classifier) -> ErrorEvent {
        let kind = self
            .kind
            .unwrap_or_else(|| classifier.classify(&self.message));
        let mut event = ErrorEvent::new(kind, self.message);
        event.file = self.file;
        event.line = self.line;
        event.action = self.action.unwrap_or_default();
        event.code_snippet = self.code_snippet;
        event
    }
}

/// Replay a JSONL event stream through `detector`.
///
/// The detector is reset at every instance boundary (including before the
/// first event), mirroring the one-reset-per-instance contract a live host
/// must follow. Blank lines are skipped; a malformed line aborts the replay
/// with its line number.
pub fn replay_stream<R: BufRead>(
    reader: R,
    detector: &mut ErrorDetector,
) -> Result<ReplayReport, ReplayError> {
    let classifier = Classifier::new();
    let mut instances: Vec<InstanceReport> = Vec::new();
    let mut current: Option<InstanceReport> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let recorded: RecordedEvent =
            serde_json::from_str(&line).map_err(|source| ReplayError::MalformedEvent {
                line: index + 1,
                source,
            })?;

        let label = recorded
            .instance
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTANCE.to_string());

        if current.as_ref().map(|c| c.instance.as_str()) != Some(label.as_str()) {
            finalize(&mut instances, &mut current, detector);
            debug!("Starting replay instance {}", label);
            detector.reset_for_instance(&label);
            current = Some(InstanceReport {
                instance: label,
                events: 0,
                suggestions: Vec::new(),
                stats: detector.stats(),
            });
        }

        let event = recorded.into_event(&classifier);
        let kind = event.kind;
        let suggestion = detector.record(event);

        if let Some(instance) = current.as_mut() {
            instance.events += 1;
            if let Some(text) = suggestion {
                let sequence_index = detector
                    .recent_events(1)
                    .first()
                    .map(|e| e.sequence_index)
                    .unwrap_or_default();
                let reason = detector
                    .detect_loop()
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                instance.suggestions.push(FiredSuggestion {
                    sequence_index,
                    kind,
                    reason,
                    text,
                });
            }
        }
    }

    finalize(&mut instances, &mut current, detector);
    Ok(ReplayReport::new(instances))
}

fn finalize(
    instances: &mut Vec<InstanceReport>,
    current: &mut Option<InstanceReport>,
    detector: &ErrorDetector,
) {
    if let Some(mut instance) = current.take() {
        instance.stats = detector.stats();
        instances.push(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn replay(input: &str) -> ReplayReport {
        let mut detector = ErrorDetector::new();
        replay_stream(Cursor::new(input), &mut detector).unwrap()
    }

    #[test]
    fn test_replay_single_instance_fires_suggestion() {
        let input = r#"
{"kind": "syntax", "message": "SyntaxError", "file": "a.py", "line": 1}
{"kind": "syntax", "message": "SyntaxError", "file": "a.py", "line": 2}
{"kind": "syntax", "message": "SyntaxError", "file": "a.py", "line": 3}
"#;
        let report = replay(input);
        assert_eq!(report.instances.len(), 1);
        assert_eq!(report.instances[0].instance, DEFAULT_INSTANCE);
        assert_eq!(report.total_events(), 3);
        assert_eq!(report.total_suggestions(), 1);
        assert!(report.instances[0].suggestions[0]
            .reason
            .contains("Repetitive syntax errors"));
    }

    #[test]
    fn test_replay_classifies_untyped_events() {
        let input = r#"
{"message": "ModuleNotFoundError: No module named 'x'"}
"#;
        let report = replay(input);
        assert_eq!(
            report.instances[0].stats.by_kind.get(&ErrorKind::Import),
            Some(&1)
        );
    }

    #[test]
    fn test_replay_resets_between_instances() {
        // Two streaks of two: neither instance alone reaches the streak,
        // so a reset-per-instance replay must fire nothing.
        let input = r#"
{"instance": "t1", "kind": "syntax", "message": "x", "file": "a.py", "line": 1}
{"instance": "t1", "kind": "syntax", "message": "x", "file": "a.py", "line": 2}
{"instance": "t2", "kind": "syntax", "message": "x", "file": "a.py", "line": 3}
{"instance": "t2", "kind": "syntax", "message": "x", "file": "a.py", "line": 4}
"#;
        let report = replay(input);
        assert_eq!(report.instances.len(), 2);
        assert_eq!(report.total_suggestions(), 0);
        assert_eq!(report.instances[0].stats.total_errors, 2);
        assert_eq!(report.instances[1].stats.total_errors, 2);
    }

    #[test]
    fn test_replay_reports_malformed_line_number() {
        let input = "{\"message\": \"ok\"}\nnot json\n";
        let mut detector = ErrorDetector::new();
        match replay_stream(Cursor::new(input), &mut detector) {
            Err(ReplayError::MalformedEvent { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedEvent, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_empty_stream() {
        let report = replay("\n\n");
        assert!(report.instances.is_empty());
        assert_eq!(report.total_events(), 0);
    }
}
