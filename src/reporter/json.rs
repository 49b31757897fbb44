//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{CheckResult, Diagnostic, SourcePos};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, result: &CheckResult) -> Result<String> {
        let report = JsonReport::from(result);

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize JSON report: {e}"),
            })
        })
    }
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: ReportSummary,
    /// All diagnostics, sorted by location
    pub diagnostics: Vec<JsonDiagnostic>,
}

impl From<&CheckResult> for JsonReport {
    fn from(result: &CheckResult) -> Self {
        let mut by_severity = BTreeMap::new();
        for diagnostic in &result.diagnostics {
            *by_severity
                .entry(diagnostic.severity.to_string().to_lowercase())
                .or_insert(0) += 1;
        }

        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                files_checked: result.files_checked.len(),
                files_skipped: result
                    .files_skipped
                    .iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect(),
                rules: result.rules.clone(),
            },
            summary: ReportSummary {
                total_issues: result.diagnostics.len(),
                issues_by_severity: by_severity,
                issues_by_rule: result.counts_by_rule(),
                has_warnings: result.has_warnings(),
            },
            diagnostics: result
                .sorted_diagnostics()
                .into_iter()
                .map(JsonDiagnostic::from)
                .collect(),
        }
    }
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// Tidemark version
    pub version: String,
    /// Report generation timestamp
    pub timestamp: String,
    /// Number of files checked
    pub files_checked: usize,
    /// Files skipped because they failed to load
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_skipped: Vec<String>,
    /// Rules that ran
    pub rules: Vec<String>,
}

/// Report summary.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    /// Total diagnostics
    pub total_issues: usize,
    /// Diagnostics grouped by severity
    pub issues_by_severity: BTreeMap<String, usize>,
    /// Diagnostics grouped by rule
    pub issues_by_rule: BTreeMap<String, usize>,
    /// Whether there are warning-level diagnostics
    pub has_warnings: bool,
}

/// JSON representation of a diagnostic.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// Rule name
    pub rule: String,
    /// Severity level
    pub severity: String,
    /// Message
    pub message: String,
    /// Location of the offending expression
    pub range: JsonRange,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            rule: diagnostic.rule.clone(),
            severity: diagnostic.severity.to_string().to_lowercase(),
            message: diagnostic.message.clone(),
            range: JsonRange {
                filename: diagnostic.range.filename.to_string_lossy().to_string(),
                start: diagnostic.range.start,
                end: diagnostic.range.end,
            },
        }
    }
}

/// JSON representation of a source range.
#[derive(Debug, Serialize)]
pub struct JsonRange {
    /// File path
    pub filename: String,
    /// Start position
    pub start: SourcePos,
    /// End position (exclusive)
    pub end: SourcePos,
}
