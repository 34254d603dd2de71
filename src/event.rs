//! Error event types for the recovery subsystem.
//!
//! An [`ErrorEvent`] is one classified failure observed by the host agent
//! after a tool action. Events are constructed by the host's observation
//! extraction path and handed to the detector, which assigns the sequence
//! index when the event is recorded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of observed errors.
///
/// Every event carries exactly one kind; anything the host (or the
/// [`Classifier`](crate::classify::Classifier)) cannot place falls back to
/// [`ErrorKind::Other`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed code: unbalanced delimiters, unterminated strings, etc.
    Syntax,
    /// Inconsistent or unexpected indentation.
    Indentation,
    /// Reference to a name that is not in scope.
    UndefinedName,
    /// Failed module resolution.
    Import,
    /// Type or attribute mismatch.
    Type,
    /// Unclassifiable diagnostic.
    Other,
}

impl ErrorKind {
    /// All kinds, in classification priority order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::Indentation,
        ErrorKind::Syntax,
        ErrorKind::UndefinedName,
        ErrorKind::Import,
        ErrorKind::Type,
        ErrorKind::Other,
    ];

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Indentation => "indentation",
            ErrorKind::UndefinedName => "undefined_name",
            ErrorKind::Import => "import",
            ErrorKind::Type => "type",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed failure, as stored in the detector's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Monotonically increasing position within one detector lifetime.
    ///
    /// Assigned by the detector when the event is recorded; not a wall
    /// clock. Values stay unique across `reset()` calls.
    #[serde(default)]
    pub sequence_index: u64,

    /// Classification of the failure.
    pub kind: ErrorKind,

    /// Raw diagnostic text. Display only; never reparsed.
    pub message: String,

    /// File the failure points at, when the host could extract one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Line the failure points at, when the host could extract one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Tool/action name that produced the error (e.g. an edit command).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,

    /// Short excerpt surrounding the failure, for display in suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl ErrorEvent {
    /// Create a new event of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            sequence_index: 0,
            kind,
            message: message.into(),
            file: None,
            line: None,
            action: String::new(),
            code_snippet: None,
        }
    }

    /// Attach a file without a line number.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach a full `(file, line)` location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Attach the action name that produced the error.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Attach a code excerpt for display.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.code_snippet = Some(snippet.into());
        self
    }

    /// The exact `(file, line)` pair, when both are present.
    pub fn location(&self) -> Option<(&str, u32)> {
        match (self.file.as_deref(), self.line) {
            (Some(file), Some(line)) => Some((file, line)),
            _ => None,
        }
    }
}
