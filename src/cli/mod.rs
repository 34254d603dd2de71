//! Command-line interface for swe-recover.
//!
//! Provides commands for replaying recorded error-event streams and for
//! classifying raw diagnostic messages.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
