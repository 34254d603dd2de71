//! Recovery suggestion templates and generation.
//!
//! Suggestions are data, not control flow: each [`ErrorKind`] maps to an
//! ordered list of remediation steps, so adding or rewording guidance is a
//! template change. The engine wraps the selected template with a loop
//! banner and escalating warnings, and owns the per-instance count of
//! suggestions emitted.

use crate::error::TemplateError;
use crate::event::ErrorKind;
use crate::patterns::LoopReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// One recovery template: a headline, numbered steps, and optional
/// tool-usage follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Headline shown above the steps, e.g. "SYNTAX ERROR - Try these steps:".
    pub title: String,
    /// Ordered remediation steps, rendered as a numbered list.
    pub steps: Vec<String>,
    /// Extra "-> use this tool" hints appended after the steps.
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

impl Template {
    fn new(title: &str, steps: &[&str], follow_ups: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            follow_ups: follow_ups.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.title);
        out.push('\n');
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }
        for hint in &self.follow_ups {
            let _ = writeln!(out, "-> {}", hint);
        }
    }
}

/// Serialized shape of a template override file.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: BTreeMap<ErrorKind, Template>,
    #[serde(default)]
    fallback: Option<Template>,
}

/// The full template table: one entry per classified kind plus a generic
/// fallback for anything unrecognized.
#[derive(Debug, Clone)]
pub struct SuggestionTemplates {
    by_kind: BTreeMap<ErrorKind, Template>,
    fallback: Template,
}

impl Default for SuggestionTemplates {
    fn default() -> Self {
        let mut by_kind = BTreeMap::new();
        by_kind.insert(
            ErrorKind::Indentation,
            Template::new(
                "INDENTATION ERROR - Common fixes:",
                &[
                    "Check that all lines use consistent spacing (4 spaces or 1 tab)",
                    "Verify the indentation matches the surrounding code",
                    "Re-open the file to see context around your edit",
                    "Compare with neighboring functions for the proper indentation level",
                ],
                &[],
            ),
        );
        by_kind.insert(
            ErrorKind::Syntax,
            Template::new(
                "SYNTAX ERROR - Try these steps:",
                &[
                    "Check for missing or extra parentheses, brackets, or quotes",
                    "Verify the lines before and after your edit are complete",
                    "Review the original code structure before editing",
                    "Look for unclosed strings, lists, or function calls",
                ],
                &[],
            ),
        );
        by_kind.insert(
            ErrorKind::UndefinedName,
            Template::new(
                "UNDEFINED NAME - Likely causes:",
                &[
                    "Missing import statement at the top of the file",
                    "Variable defined in a different scope",
                    "Typo in the variable or function name",
                    "Variable defined after it is used",
                ],
                &[
                    "Search the file to find where this name is defined",
                    "Search the whole codebase if it lives in another module",
                ],
            ),
        );
        by_kind.insert(
            ErrorKind::Import,
            Template::new(
                "IMPORT ERROR - Solutions:",
                &[
                    "Check whether the module is available in this environment",
                    "Verify the import path is correct (relative vs absolute)",
                    "Look for similar imports elsewhere in the codebase",
                    "Check whether the module needs to be installed",
                ],
                &["Search the codebase for existing import patterns"],
            ),
        );
        by_kind.insert(
            ErrorKind::Type,
            Template::new(
                "TYPE/ATTRIBUTE ERROR - Check:",
                &[
                    "Variable types match the operations applied to them",
                    "The object actually has the attribute or method you call",
                    "The object's class definition",
                    "Function signatures and argument types",
                ],
                &["Search for the class or function definition before editing"],
            ),
        );

        let fallback = Template::new(
            "ERROR DETECTED - Consider a different approach:",
            &[
                "Re-read the error message carefully",
                "Review the surrounding code for context",
                "Try a simpler, incremental change",
            ],
            &[],
        );

        Self { by_kind, fallback }
    }
}

impl SuggestionTemplates {
    /// Load overrides from a YAML file, merged over the builtin table.
    ///
    /// Kinds absent from the file keep their builtin templates; the
    /// fallback is replaced only when the file provides one.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Parse overrides from YAML text, merged over the builtin table.
    pub fn from_yaml_str(raw: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = serde_yaml::from_str(raw)?;
        let mut merged = Self::default();
        for (kind, template) in file.templates {
            validate(kind.as_str(), &template)?;
            merged.by_kind.insert(kind, template);
        }
        if let Some(fallback) = file.fallback {
            validate("fallback", &fallback)?;
            merged.fallback = fallback;
        }
        Ok(merged)
    }

    /// The template for `kind`, or the fallback when none is registered.
    pub fn get(&self, kind: ErrorKind) -> &Template {
        self.by_kind.get(&kind).unwrap_or(&self.fallback)
    }
}

fn validate(kind: &str, template: &Template) -> Result<(), TemplateError> {
    if template.title.trim().is_empty() {
        return Err(TemplateError::EmptyTitle {
            kind: kind.to_string(),
        });
    }
    if template.steps.is_empty() {
        return Err(TemplateError::EmptySteps {
            kind: kind.to_string(),
        });
    }
    Ok(())
}

/// Generates recovery text and owns the emitted-suggestion counter.
#[derive(Debug)]
pub struct SuggestionEngine {
    templates: SuggestionTemplates,
    recovery_attempts: u32,
}

impl SuggestionEngine {
    pub fn new(templates: SuggestionTemplates) -> Self {
        Self {
            templates,
            recovery_attempts: 0,
        }
    }

    /// Suggestions emitted since the last reset.
    pub fn attempts(&self) -> u32 {
        self.recovery_attempts
    }

    /// Clear the emitted-suggestion counter for a new instance.
    pub fn reset(&mut self) {
        self.recovery_attempts = 0;
    }

    /// Produce recovery text for the triggering event's kind.
    ///
    /// Increments the recovery-attempt counter by exactly one. Never fails:
    /// kinds without a template use the generic fallback. `kind_occurrences`
    /// and `total_errors` are the instance counters at the time the loop
    /// fired; they drive the banner wording and the escalation blocks.
    pub fn generate(
        &mut self,
        kind: ErrorKind,
        reason: Option<&LoopReason>,
        kind_occurrences: u64,
        total_errors: u64,
    ) -> String {
        self.recovery_attempts += 1;

        let mut out = String::new();
        if let Some(reason) = reason {
            let _ = writeln!(out, "LOOP DETECTED: {}", reason);
            let _ = writeln!(
                out,
                "This is your {} {} error (recovery hint #{}).",
                ordinal(kind_occurrences),
                kind,
                self.recovery_attempts
            );
            out.push('\n');
        }

        self.templates.get(kind).render(&mut out);

        if kind_occurrences >= 3 {
            out.push('\n');
            out.push_str("WARNING: the same kind of error keeps coming back. Consider:\n");
            out.push_str("- Taking a completely different approach to this change\n");
            out.push_str("- Re-reading the file to understand the surrounding context\n");
            out.push_str("- Starting with a smaller, simpler edit\n");
            out.push_str("- Searching the repository for similar code patterns\n");
        }

        if total_errors >= 7 {
            out.push('\n');
            let _ = writeln!(
                out,
                "TOTAL ERRORS THIS ATTEMPT: {}. The current strategy may be wrong; step back before editing again.",
                total_errors
            );
        }

        out
    }
}

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, ... 11th, 12th, 13th.
fn ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
