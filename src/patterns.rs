//! Loop detection heuristics over the trailing event window.
//!
//! The recognizer is a pure function of the most recent events: it never
//! mutates history and never looks past the configured window. Four
//! heuristics run in a fixed priority order and the first match wins, so at
//! most one loop reason is reported per recorded event.

use crate::event::{ErrorEvent, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why the recent history was judged an unproductive loop.
///
/// The `Display` rendering of each variant is part of the logging contract:
/// external audit tooling greps for these exact phrasings after the
/// "Loop detected" marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LoopReason {
    /// The last `streak` events all share one kind.
    RepetitiveKind { kind: ErrorKind, count: usize },
    /// The last `streak` events all point at the same `(file, line)`.
    SameLocation {
        file: String,
        line: u32,
        count: usize,
    },
    /// The window alternates between exactly two kinds.
    Alternating { first: ErrorKind, second: ErrorKind },
    /// Several window events pile up in one file.
    SameFile { file: String, count: usize },
}

impl fmt::Display for LoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopReason::RepetitiveKind { kind, .. } => {
                write!(f, "Repetitive {} errors detected", kind)
            }
            LoopReason::SameLocation { line, .. } => {
                write!(f, "Repeatedly failing at line {}", line)
            }
            LoopReason::Alternating { first, second } => {
                write!(f, "Alternating between {{{}, {}}} errors", first, second)
            }
            LoopReason::SameFile { file, .. } => {
                write!(f, "Multiple errors in same file: {}", file)
            }
        }
    }
}

/// Evaluates the loop heuristics over a trailing window of events.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    /// Events the last-K heuristics require (repetitive kind, same location).
    streak: usize,
    /// Window events that must share a file for the same-file heuristic.
    same_file_min: usize,
}

impl PatternRecognizer {
    pub fn new(streak: usize, same_file_min: usize) -> Self {
        Self {
            streak: streak.max(2),
            same_file_min: same_file_min.max(2),
        }
    }

    /// Decide whether `window` (the trailing W events, oldest first)
    /// constitutes a loop.
    ///
    /// Heuristic order: repetitive kind, then exact location, then
    /// alternation, then same file. Runs that repeat both kind and location
    /// therefore report as repetitive-kind; the order is fixed so the
    /// outcome is deterministic.
    pub fn detect(&self, window: &[&ErrorEvent]) -> Option<LoopReason> {
        if window.len() < self.streak {
            // Insufficient evidence.
            return None;
        }

        self.repetitive_kind(window)
            .or_else(|| self.same_location(window))
            .or_else(|| self.alternating(window))
            .or_else(|| self.same_file(window))
    }

    /// Heuristic 1: the last `streak` events all share one kind.
    ///
    /// `other` is excluded: a run of unclassifiable errors says nothing
    /// about what the agent keeps getting wrong.
    fn repetitive_kind(&self, window: &[&ErrorEvent]) -> Option<LoopReason> {
        let tail = &window[window.len() - self.streak..];
        let kind = tail[0].kind;
        if kind != ErrorKind::Other && tail.iter().all(|e| e.kind == kind) {
            return Some(LoopReason::RepetitiveKind {
                kind,
                count: self.streak,
            });
        }
        None
    }

    /// Heuristic 2: the last `streak` events share a nonempty `(file, line)`.
    fn same_location(&self, window: &[&ErrorEvent]) -> Option<LoopReason> {
        let tail = &window[window.len() - self.streak..];
        let (file, line) = tail[0].location()?;
        if tail.iter().all(|e| e.location() == Some((file, line))) {
            return Some(LoopReason::SameLocation {
                file: file.to_string(),
                line,
                count: self.streak,
            });
        }
        None
    }

    /// Heuristic 3: the window holds exactly two distinct kinds, each seen
    /// at least twice, with no third kind present.
    fn alternating(&self, window: &[&ErrorEvent]) -> Option<LoopReason> {
        let mut counts: Vec<(ErrorKind, usize)> = Vec::with_capacity(2);
        for event in window {
            match counts.iter_mut().find(|(kind, _)| *kind == event.kind) {
                Some((_, n)) => *n += 1,
                None => {
                    if counts.len() == 2 {
                        return None; // third kind present
                    }
                    counts.push((event.kind, 1));
                }
            }
        }
        match counts.as_slice() {
            [(a, na), (b, nb)] if *na >= 2 && *nb >= 2 => Some(LoopReason::Alternating {
                first: *a,
                second: *b,
            }),
            _ => None,
        }
    }

    /// Heuristic 4: at least `same_file_min` window events share one file,
    /// regardless of kind or line.
    fn same_file(&self, window: &[&ErrorEvent]) -> Option<LoopReason> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for event in window {
            if let Some(file) = event.file.as_deref() {
                *counts.entry(file).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count >= self.same_file_min)
            .max_by_key(|&(_, count)| count)
            .map(|(file, count)| LoopReason::SameFile {
                file: file.to_string(),
                count,
            })
    }
}
