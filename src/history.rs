//! Bounded error history for one task instance.
//!
//! The log owns all mutable detector state: the most recent events (FIFO,
//! capacity-bounded) plus unbounded counters that survive eviction. Loop
//! heuristics only ever look at a small trailing window, so eviction never
//! changes their outcome.

use crate::event::{ErrorEvent, ErrorKind};
use std::collections::{BTreeMap, VecDeque};

/// Append-only, capacity-bounded sequence of classified error events.
#[derive(Debug)]
pub struct ErrorLog {
    events: VecDeque<ErrorEvent>,
    capacity: usize,
    next_sequence: u64,
    total_recorded: u64,
    by_kind: BTreeMap<ErrorKind, u64>,
}

impl ErrorLog {
    /// Create a log bounded to `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            next_sequence: 0,
            total_recorded: 0,
            by_kind: BTreeMap::new(),
        }
    }

    /// Append an event, assigning its sequence index. Evicts the oldest
    /// event once the capacity is exceeded. Always succeeds.
    pub fn push(&mut self, mut event: ErrorEvent) -> u64 {
        let sequence = self.next_sequence;
        event.sequence_index = sequence;
        self.next_sequence += 1;
        self.total_recorded += 1;
        *self.by_kind.entry(event.kind).or_insert(0) += 1;

        self.events.push_back(event);
        if self.events.len() > self.capacity {
            self.events.pop_front();
        }
        sequence
    }

    /// Discard all events and counters.
    ///
    /// Sequence numbers are NOT rewound: they stay unique and increasing for
    /// the whole detector lifetime, across instance resets.
    pub fn clear(&mut self) {
        self.events.clear();
        self.total_recorded = 0;
        self.by_kind.clear();
    }

    /// Number of events currently retained (≤ capacity).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events recorded in this instance, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Per-kind counts for this instance, including evicted events.
    pub fn by_kind(&self) -> &BTreeMap<ErrorKind, u64> {
        &self.by_kind
    }

    /// Count recorded for one kind in this instance.
    pub fn kind_count(&self, kind: ErrorKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Most recently recorded event still retained.
    pub fn last(&self) -> Option<&ErrorEvent> {
        self.events.back()
    }

    /// Retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorEvent> {
        self.events.iter()
    }

    /// The trailing `n` retained events, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &ErrorEvent> {
        self.events.iter().skip(self.events.len().saturating_sub(n))
    }

    /// Length of the run of same-kind events at the tail of the history.
    pub fn consecutive_same_kind(&self) -> usize {
        let Some(last) = self.events.back() else {
            return 0;
        };
        self.events
            .iter()
            .rev()
            .take_while(|e| e.kind == last.kind)
            .count()
    }

    /// Kind with the highest count this instance. First-seen kind wins ties.
    pub fn most_common_kind(&self) -> Option<ErrorKind> {
        let mut best: Option<(ErrorKind, u64)> = None;
        for (&kind, &count) in &self.by_kind {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((kind, count)),
            }
        }
        best.map(|(kind, _)| kind)
    }

    /// Number of distinct files among retained events.
    pub fn distinct_files(&self) -> usize {
        let mut files: Vec<&str> = self.events.iter().filter_map(|e| e.file.as_deref()).collect();
        files.sort_unstable();
        files.dedup();
        files.len()
    }

    /// The retained file with the most errors, if any event carries a file.
    pub fn most_problematic_file(&self) -> Option<&str> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for event in &self.events {
            if let Some(file) = event.file.as_deref() {
                *counts.entry(file).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
            .map(|(file, _)| file)
    }

    /// Lines in `file` with at least `threshold` retained errors.
    pub fn problematic_lines(&self, file: &str, threshold: usize) -> Vec<u32> {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for event in &self.events {
            if let Some((event_file, line)) = event.location() {
                if event_file == file {
                    *counts.entry(line).or_insert(0) += 1;
                }
            }
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count >= threshold)
            .map(|(line, _)| line)
            .collect()
    }

    /// Retained events of one kind, oldest first.
    pub fn errors_by_kind(&self, kind: ErrorKind) -> Vec<&ErrorEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    /// Retained events in one file, oldest first.
    pub fn errors_in_file(&self, file: &str) -> Vec<&ErrorEvent> {
        self.events
            .iter()
            .filter(|e| e.file.as_deref() == Some(file))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_at(file: &str, line: u32) -> ErrorEvent {
        ErrorEvent::new(ErrorKind::Syntax, "SyntaxError").with_location(file, line)
    }

    #[test]
    fn test_push_assigns_increasing_sequence_indices() {
        let mut log = ErrorLog::with_capacity(10);
        let a = log.push(ErrorEvent::new(ErrorKind::Syntax, "a"));
        let b = log.push(ErrorEvent::new(ErrorKind::Import, "b"));
        assert_eq!((a, b), (0, 1));
        let stored: Vec<u64> = log.iter().map(|e| e.sequence_index).collect();
        assert_eq!(stored, vec![0, 1]);
    }

    #[test]
    fn test_eviction_is_fifo_and_counters_survive() {
        let mut log = ErrorLog::with_capacity(3);
        for i in 0..5 {
            log.push(syntax_at("a.py", i));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_recorded(), 5);
        assert_eq!(log.kind_count(ErrorKind::Syntax), 5);
        // Oldest two evicted; retained sequence indices are 2, 3, 4.
        let retained: Vec<u64> = log.iter().map(|e| e.sequence_index).collect();
        assert_eq!(retained, vec![2, 3, 4]);
    }

    #[test]
    fn test_clear_resets_counters_but_not_sequence() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(ErrorEvent::new(ErrorKind::Syntax, "a"));
        log.push(ErrorEvent::new(ErrorKind::Syntax, "b"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.total_recorded(), 0);
        assert_eq!(log.kind_count(ErrorKind::Syntax), 0);

        let next = log.push(ErrorEvent::new(ErrorKind::Import, "c"));
        assert_eq!(next, 2, "sequence indices stay unique across clears");
    }

    #[test]
    fn test_tail_returns_most_recent_in_order() {
        let mut log = ErrorLog::with_capacity(10);
        for i in 0..4 {
            log.push(syntax_at("a.py", i));
        }
        let tail: Vec<u64> = log.tail(2).map(|e| e.sequence_index).collect();
        assert_eq!(tail, vec![2, 3]);
        // Asking for more than is retained yields everything.
        assert_eq!(log.tail(99).count(), 4);
    }

    #[test]
    fn test_consecutive_same_kind_counts_tail_run() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(ErrorEvent::new(ErrorKind::Import, "a"));
        log.push(ErrorEvent::new(ErrorKind::Syntax, "b"));
        log.push(ErrorEvent::new(ErrorKind::Syntax, "c"));
        assert_eq!(log.consecutive_same_kind(), 2);

        log.push(ErrorEvent::new(ErrorKind::Import, "d"));
        assert_eq!(log.consecutive_same_kind(), 1);
    }

    #[test]
    fn test_consecutive_same_kind_empty() {
        let log = ErrorLog::with_capacity(10);
        assert_eq!(log.consecutive_same_kind(), 0);
    }

    #[test]
    fn test_most_common_kind_prefers_first_seen_on_tie() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(ErrorEvent::new(ErrorKind::Syntax, "a"));
        log.push(ErrorEvent::new(ErrorKind::Import, "b"));
        // One of each: BTreeMap order makes Syntax the deterministic winner.
        assert_eq!(log.most_common_kind(), Some(ErrorKind::Syntax));

        log.push(ErrorEvent::new(ErrorKind::Import, "c"));
        assert_eq!(log.most_common_kind(), Some(ErrorKind::Import));
    }

    #[test]
    fn test_distinct_files_ignores_missing() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(syntax_at("a.py", 1));
        log.push(syntax_at("b.py", 2));
        log.push(syntax_at("a.py", 3));
        log.push(ErrorEvent::new(ErrorKind::Other, "no file"));
        assert_eq!(log.distinct_files(), 2);
    }

    #[test]
    fn test_most_problematic_file() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(syntax_at("a.py", 1));
        log.push(syntax_at("b.py", 2));
        log.push(syntax_at("b.py", 3));
        assert_eq!(log.most_problematic_file(), Some("b.py"));
    }

    #[test]
    fn test_problematic_lines_threshold() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(syntax_at("a.py", 10));
        log.push(syntax_at("a.py", 10));
        log.push(syntax_at("a.py", 20));
        log.push(syntax_at("b.py", 10));
        assert_eq!(log.problematic_lines("a.py", 2), vec![10]);
        assert!(log.problematic_lines("b.py", 2).is_empty());
    }

    #[test]
    fn test_filters_by_kind_and_file() {
        let mut log = ErrorLog::with_capacity(10);
        log.push(syntax_at("a.py", 1));
        log.push(ErrorEvent::new(ErrorKind::Import, "b").with_file("a.py"));
        assert_eq!(log.errors_by_kind(ErrorKind::Syntax).len(), 1);
        assert_eq!(log.errors_in_file("a.py").len(), 2);
        assert!(log.errors_in_file("c.py").is_empty());
    }
}
