//! Report types for replayed error-recovery traces.

use crate::event::ErrorKind;
use crate::stats::DetectorStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// Result of replaying a recorded event stream through a detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Unique identifier for this replay run.
    pub run_id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// One entry per task instance, in stream order.
    pub instances: Vec<InstanceReport>,
}

impl ReplayReport {
    pub fn new(instances: Vec<InstanceReport>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            instances,
        }
    }

    /// Events replayed across all instances.
    pub fn total_events(&self) -> u64 {
        self.instances.iter().map(|i| i.events).sum()
    }

    /// Suggestions fired across all instances.
    pub fn total_suggestions(&self) -> usize {
        self.instances.iter().map(|i| i.suggestions.len()).sum()
    }

    /// Plain-text rendering for terminal output.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "replayed {} events across {} instances ({} suggestions fired)",
            self.total_events(),
            self.instances.len(),
            self.total_suggestions()
        );
        for instance in &self.instances {
            let _ = writeln!(out, "\ninstance {}", instance.instance);
            for fired in &instance.suggestions {
                let _ = writeln!(
                    out,
                    "  #{} [{}] {}",
                    fired.sequence_index, fired.kind, fired.reason
                );
            }
            for line in instance.stats.to_string().lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        out
    }
}

/// Replay outcome for one task instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReport {
    /// Instance label from the stream ("default" when unlabeled).
    pub instance: String,
    /// Events replayed into this instance.
    pub events: u64,
    /// Suggestions the detector fired, in order.
    pub suggestions: Vec<FiredSuggestion>,
    /// End-of-instance statistics snapshot.
    pub stats: DetectorStats,
}

/// One suggestion emitted during replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredSuggestion {
    /// Sequence index of the event that triggered the suggestion.
    pub sequence_index: u64,
    /// Kind of the triggering event.
    pub kind: ErrorKind,
    /// Loop reason, as logged after "Loop detected".
    pub reason: String,
    /// Full recovery text handed back to the agent.
    pub text: String,
}
