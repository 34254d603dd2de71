//! Regex-based classification of raw diagnostic messages.
//!
//! The detector core consumes already-classified events; this module is the
//! helper the host's observation-extraction path uses to map a diagnostic
//! message onto the closed [`ErrorKind`] set. It never parses tool output
//! beyond the extracted message text.

use crate::event::ErrorKind;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Known diagnostic families, checked in order. First match wins.
const KNOWN_PATTERNS: &[(ErrorKind, &str)] = &[
    (
        ErrorKind::Indentation,
        r"IndentationError|unexpected indent|expected an indented block|unindent does not match",
    ),
    (
        ErrorKind::Syntax,
        r"SyntaxError|invalid syntax|EOF while scanning|unterminated string|unexpected EOF|invalid character",
    ),
    (
        ErrorKind::UndefinedName,
        r"NameError|undefined|not defined|name .* is not defined",
    ),
    (
        ErrorKind::Import,
        r"ImportError|ModuleNotFoundError|cannot import|No module named",
    ),
    (
        ErrorKind::Type,
        r"TypeError|AttributeError|object has no attribute|takes .* positional argument",
    ),
];

/// Maps diagnostic messages onto the closed error classification.
pub struct Classifier {
    patterns: Vec<(ErrorKind, Regex)>,
}

impl Classifier {
    /// Build a classifier over the builtin pattern table.
    pub fn new() -> Self {
        Self {
            patterns: compile_patterns(KNOWN_PATTERNS.iter().map(|(k, p)| (*k, (*p).to_string()))),
        }
    }

    /// Build a classifier over a custom pattern table, checked in order.
    pub fn with_patterns(
        patterns: impl IntoIterator<Item = (ErrorKind, String)>,
    ) -> Result<Self, regex::Error> {
        let mut compiled = Vec::new();
        for (kind, pattern) in patterns {
            let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
            compiled.push((kind, regex));
        }
        Ok(Self { patterns: compiled })
    }

    /// Classify a diagnostic message.
    ///
    /// Empty or unrecognized messages classify as [`ErrorKind::Other`];
    /// classification never fails.
    pub fn classify(&self, message: &str) -> ErrorKind {
        if message.is_empty() {
            warn!("Empty error message received");
            return ErrorKind::Other;
        }

        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(message))
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Other)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_patterns(
    patterns: impl Iterator<Item = (ErrorKind, String)>,
) -> Vec<(ErrorKind, Regex)> {
    // Builtin patterns are fixed strings; a pattern that fails to compile is
    // skipped rather than taking the classifier down.
    patterns
        .filter_map(|(kind, pattern)| {
            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(regex) => Some((kind, regex)),
                Err(e) => {
                    warn!("Skipping unparseable pattern for '{}': {}", kind, e);
                    None
                }
            }
        })
        .collect()
}
