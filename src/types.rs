//! Core data types used throughout Tidemark.
//!
//! This module defines the fundamental data structures for representing:
//! - Source positions and ranges inside Terraform files
//! - Diagnostics emitted by rules
//! - Check results and report formats

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A position inside a source file.
///
/// Lines and columns are 1-based. `byte` is the 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourcePos {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
    /// Byte offset (0-based)
    pub byte: usize,
}

impl SourcePos {
    /// Create a new position.
    #[must_use]
    pub const fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

/// A range inside a source file, used as the anchor of a diagnostic.
///
/// `end` points one past the last character of the range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    /// File the range belongs to
    pub filename: PathBuf,
    /// Start position (inclusive)
    pub start: SourcePos,
    /// End position (exclusive)
    pub end: SourcePos,
}

impl SourceRange {
    /// Create a new range.
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, start: SourcePos, end: SourcePos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.filename.display(),
            self.start.line,
            self.start.column
        )
    }
}

/// Severity level for diagnostics.
///
/// Both rules report convention violations, so warnings are the only level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Convention violation
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// A single issue reported by a rule.
///
/// Diagnostics are produced once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the rule that emitted this diagnostic
    pub rule: String,
    /// Severity of the emitting rule
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Location the diagnostic is anchored to
    pub range: SourceRange,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// JSON format
    Json,
    /// Plain text format
    #[default]
    Text,
}

/// Result of checking a set of Terraform files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckResult {
    /// Files that were parsed and handed to the rules
    pub files_checked: Vec<PathBuf>,

    /// Files that failed to load and were skipped (`continue_on_error`)
    pub files_skipped: Vec<PathBuf>,

    /// Names of the rules that ran
    pub rules: Vec<String>,

    /// All diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    /// Check if there are any warning-level diagnostics.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Count diagnostics per rule name.
    #[must_use]
    pub fn counts_by_rule(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.rule.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Diagnostics sorted by file, then position.
    #[must_use]
    pub fn sorted_diagnostics(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.diagnostics.iter().collect();
        sorted.sort_by(|a, b| a.range.cmp(&b.range).then_with(|| a.rule.cmp(&b.rule)));
        sorted
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate_report(&self, format: ReportFormat) -> crate::Result<String> {
        let config = crate::Config::default();
        let reporter = crate::reporter::Reporter::new(&config);
        reporter.generate(self, format)
    }
}
