//! Error types for swe-recover operations.
//!
//! The detector itself is total and never fails; fallible surfaces are the
//! suggestion template loader and the trace replay reader.

use thiserror::Error;

/// Errors that can occur while loading suggestion template overrides.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template for '{kind}' has no remediation steps")]
    EmptySteps { kind: String },

    #[error("Template for '{kind}' has an empty title")]
    EmptyTitle { kind: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur while replaying a recorded event stream.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Malformed event on line {line}: {source}")]
    MalformedEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
