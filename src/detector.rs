//! Error detector facade.
//!
//! The sole integration surface for host agent loops: `record()` an error
//! event after every failed observation and `reset()` once at the start of
//! every task instance. Everything else (bounded history, window
//! evaluation, suggestion generation) happens inside this module's
//! composition of [`ErrorLog`], [`PatternRecognizer`] and
//! [`SuggestionEngine`].
//!
//! One detector per concurrently running task instance. The detector is a
//! single-writer state machine; it performs no I/O and never blocks, so no
//! locking is needed as long as each instance owns its detector.

use crate::event::{ErrorEvent, ErrorKind};
use crate::history::ErrorLog;
use crate::patterns::{LoopReason, PatternRecognizer};
use crate::stats::DetectorStats;
use crate::suggest::{SuggestionEngine, SuggestionTemplates};
use tracing::{debug, info, warn};

/// Tuning knobs for history bounds and loop heuristics.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Events retained before FIFO eviction.
    pub history_capacity: usize,
    /// Trailing events the loop heuristics may inspect.
    pub window: usize,
    /// Run length required by the repetitive-kind and same-location
    /// heuristics.
    pub streak: usize,
    /// Window events that must share a file for the same-file heuristic.
    pub same_file_min: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            window: 5,
            streak: 3,
            same_file_min: 3,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_streak(mut self, streak: usize) -> Self {
        self.streak = streak;
        self
    }

    pub fn with_same_file_min(mut self, same_file_min: usize) -> Self {
        self.same_file_min = same_file_min;
        self
    }
}

/// Stateful error-pattern detector and loop breaker for one task instance.
///
/// Owned by the host's per-instance context and reset at every instance
/// boundary; sharing one detector across instances without resetting
/// contaminates loop detection with stale history.
#[derive(Debug)]
pub struct ErrorDetector {
    config: DetectorConfig,
    log: ErrorLog,
    recognizer: PatternRecognizer,
    engine: SuggestionEngine,
}

impl Default for ErrorDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorDetector {
    /// Detector with default bounds and builtin suggestion templates.
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            log: ErrorLog::with_capacity(config.history_capacity),
            recognizer: PatternRecognizer::new(config.streak, config.same_file_min),
            engine: SuggestionEngine::new(SuggestionTemplates::default()),
            config,
        }
    }

    /// Replace the suggestion template table.
    pub fn with_templates(mut self, templates: SuggestionTemplates) -> Self {
        self.engine = SuggestionEngine::new(templates);
        self
    }

    /// Record a classified error event.
    ///
    /// Appends to the bounded history, evaluates the loop heuristics over
    /// the trailing window, and returns recovery text when a loop is
    /// detected. Total: never fails, never blocks. Partially populated
    /// events (no file/line) simply keep the location heuristics from
    /// firing.
    pub fn record(&mut self, event: ErrorEvent) -> Option<String> {
        let kind = event.kind;
        let location = match (event.file.as_deref(), event.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            (Some(file), None) => Some(file.to_string()),
            _ => None,
        };

        self.log.push(event);
        match &location {
            Some(location) => debug!("Error added: {} at {}", kind, location),
            None => debug!("Error added: {}", kind),
        }

        let reason = self.detect_loop()?;
        warn!("Loop detected: {}", reason);

        let kind_occurrences = self.log.kind_count(kind);
        let total_errors = self.log.total_recorded();
        Some(
            self.engine
                .generate(kind, Some(&reason), kind_occurrences, total_errors),
        )
    }

    /// Evaluate the loop heuristics over the current trailing window
    /// without recording anything.
    pub fn detect_loop(&self) -> Option<LoopReason> {
        let window: Vec<&ErrorEvent> = self.log.tail(self.config.window).collect();
        self.recognizer.detect(&window)
    }

    /// Discard all per-instance state for a new task instance.
    ///
    /// Idempotent and safe to call on a fresh detector. Must be called
    /// exactly once before each instance's first `record`, including every
    /// iteration of a batch run.
    pub fn reset(&mut self) {
        self.log.clear();
        self.engine.reset();
        info!("Error detector reset for new instance");
    }

    /// [`reset`](Self::reset), tagging the log line with the instance id.
    pub fn reset_for_instance(&mut self, instance_id: &str) {
        self.log.clear();
        self.engine.reset();
        info!("Error detector reset for instance {}", instance_id);
    }

    /// Aggregate snapshot for end-of-run reporting. Read-only.
    pub fn stats(&self) -> DetectorStats {
        DetectorStats::collect(&self.log, self.config.window, self.engine.attempts())
    }

    /// Human-readable rendering of [`stats`](Self::stats).
    pub fn summary(&self) -> String {
        self.stats().to_string()
    }

    /// Whether the instance has degraded enough that the agent should
    /// abandon its current approach entirely: three consecutive same-kind
    /// errors, or five recorded errors overall.
    pub fn should_switch_strategy(&self) -> bool {
        if self.log.total_recorded() >= 5 {
            return true;
        }
        self.log.consecutive_same_kind() >= 3
            && self.log.last().is_some_and(|e| e.kind != ErrorKind::Other)
    }

    /// Suggestions emitted this instance.
    pub fn recovery_attempts(&self) -> u32 {
        self.engine.attempts()
    }

    /// The `n` most recent retained events, oldest first.
    pub fn recent_events(&self, n: usize) -> Vec<&ErrorEvent> {
        self.log.tail(n).collect()
    }

    /// Read access to the bounded history, for host-side display.
    pub fn history(&self) -> impl Iterator<Item = &ErrorEvent> {
        self.log.iter()
    }

    /// Retained events in one file, oldest first.
    pub fn errors_in_file(&self, file: &str) -> Vec<&ErrorEvent> {
        self.log.errors_in_file(file)
    }

    /// Lines in `file` with at least `threshold` retained errors, for
    /// host-side hints about where edits keep going wrong.
    pub fn problematic_lines(&self, file: &str, threshold: usize) -> Vec<u32> {
        self.log.problematic_lines(file, threshold)
    }
}
