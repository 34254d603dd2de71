//! Aggregate statistics over one instance's error history.

use crate::event::ErrorKind;
use crate::history::ErrorLog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Read-only snapshot of the detector state, for end-of-run reporting.
///
/// `total_errors` and `by_kind` count every recorded event, including ones
/// already evicted from the bounded history; the file- and run-derived
/// fields are computed over the retained events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub total_errors: u64,
    pub by_kind: BTreeMap<ErrorKind, u64>,
    /// Events inside the recognizer window right now.
    pub recent_errors: usize,
    /// Suggestions emitted this instance.
    pub recovery_attempts: u32,
    pub most_common_kind: Option<ErrorKind>,
    /// Distinct files among retained events.
    pub files_affected: usize,
    /// Length of the same-kind run at the tail of the history.
    pub consecutive_same_kind: usize,
    pub most_problematic_file: Option<String>,
}

impl DetectorStats {
    /// Snapshot the log. Does not mutate anything.
    pub fn collect(log: &ErrorLog, window: usize, recovery_attempts: u32) -> Self {
        Self {
            total_errors: log.total_recorded(),
            by_kind: log.by_kind().clone(),
            recent_errors: log.len().min(window),
            recovery_attempts,
            most_common_kind: log.most_common_kind(),
            files_affected: log.distinct_files(),
            consecutive_same_kind: log.consecutive_same_kind(),
            most_problematic_file: log.most_problematic_file().map(str::to_string),
        }
    }
}

impl fmt::Display for DetectorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error recovery summary")?;
        writeln!(f, "  total errors:      {}", self.total_errors)?;
        writeln!(f, "  recent errors:     {}", self.recent_errors)?;
        writeln!(f, "  recovery attempts: {}", self.recovery_attempts)?;
        writeln!(f, "  files affected:    {}", self.files_affected)?;
        writeln!(f, "  tail run length:   {}", self.consecutive_same_kind)?;
        if let Some(kind) = self.most_common_kind {
            writeln!(f, "  most common kind:  {}", kind)?;
        }
        if let Some(file) = &self.most_problematic_file {
            writeln!(f, "  worst file:        {}", file)?;
        }
        if !self.by_kind.is_empty() {
            writeln!(f, "  by kind:")?;
            for (kind, count) in &self.by_kind {
                let share = if self.total_errors > 0 {
                    100.0 * *count as f64 / self.total_errors as f64
                } else {
                    0.0
                };
                writeln!(f, "    {}: {} ({:.1}%)", kind, count, share)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ErrorEvent;

    #[test]
    fn test_collect_on_empty_log() {
        let log = ErrorLog::with_capacity(50);
        let stats = DetectorStats::collect(&log, 5, 0);
        assert_eq!(stats.total_errors, 0);
        assert!(stats.by_kind.is_empty());
        assert_eq!(stats.recent_errors, 0);
        assert_eq!(stats.recovery_attempts, 0);
        assert_eq!(stats.most_common_kind, None);
        assert_eq!(stats.files_affected, 0);
        assert_eq!(stats.consecutive_same_kind, 0);
        assert_eq!(stats.most_problematic_file, None);
    }

    #[test]
    fn test_collect_counts_and_derived_fields() {
        let mut log = ErrorLog::with_capacity(50);
        log.push(ErrorEvent::new(ErrorKind::Syntax, "a").with_location("x.py", 1));
        log.push(ErrorEvent::new(ErrorKind::Syntax, "b").with_location("x.py", 2));
        log.push(ErrorEvent::new(ErrorKind::Import, "c").with_location("y.py", 3));

        let stats = DetectorStats::collect(&log, 5, 1);
        assert_eq!(stats.total_errors, 3);
        assert_eq!(stats.by_kind.get(&ErrorKind::Syntax), Some(&2));
        assert_eq!(stats.most_common_kind, Some(ErrorKind::Syntax));
        assert_eq!(stats.files_affected, 2);
        assert_eq!(stats.consecutive_same_kind, 1);
        assert_eq!(stats.most_problematic_file.as_deref(), Some("x.py"));
        assert_eq!(stats.recovery_attempts, 1);
    }

    #[test]
    fn test_recent_errors_caps_at_window() {
        let mut log = ErrorLog::with_capacity(50);
        for i in 0..8 {
            log.push(ErrorEvent::new(ErrorKind::Syntax, "x").with_location("a.py", i));
        }
        let stats = DetectorStats::collect(&log, 5, 0);
        assert_eq!(stats.recent_errors, 5);
    }

    #[test]
    fn test_display_renders_counts() {
        let mut log = ErrorLog::with_capacity(50);
        log.push(ErrorEvent::new(ErrorKind::Syntax, "a").with_location("x.py", 1));
        log.push(ErrorEvent::new(ErrorKind::Syntax, "b"));

        let rendered = DetectorStats::collect(&log, 5, 2).to_string();
        assert!(rendered.contains("total errors:      2"));
        assert!(rendered.contains("recovery attempts: 2"));
        assert!(rendered.contains("syntax: 2 (100.0%)"));
    }

    #[test]
    fn test_stats_serialize_with_kind_keys() {
        let mut log = ErrorLog::with_capacity(50);
        log.push(ErrorEvent::new(ErrorKind::UndefinedName, "a"));
        let stats = DetectorStats::collect(&log, 5, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_kind"]["undefined_name"], 1);
        assert_eq!(json["most_common_kind"], "undefined_name");
    }
}
