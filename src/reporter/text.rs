//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{CheckResult, Diagnostic};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, result: &CheckResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header());
        output.push('\n');

        output.push_str(&self.format_summary(result));
        output.push('\n');

        if !result.diagnostics.is_empty() {
            output.push_str(&self.format_diagnostics(result));
            output.push('\n');

            output.push_str(&self.format_rule_table(result));
            output.push('\n');
        }

        output.push_str(&self.format_footer(result));

        Ok(output)
    }
}

impl TextReporter {
    fn format_header(&self) -> String {
        let title = "Tidemark Check";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                format!("({timestamp})").dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} ({timestamp})\n{}\n", "=".repeat(80))
        }
    }

    fn section_title(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    fn format_summary(&self, result: &CheckResult) -> String {
        let mut output = self.section_title("Summary");

        let warnings = result.diagnostics.len();
        let label = if warnings == 1 { "Warning" } else { "Warnings" };

        if self.use_colors {
            output.push_str(&format!(
                "  {} {label}\n",
                warnings.to_string().yellow().bold()
            ));
        } else {
            output.push_str(&format!("  {warnings} {label}\n"));
        }

        output.push_str(&format!(
            "  {} files checked | {} skipped | {} rules\n",
            result.files_checked.len(),
            result.files_skipped.len(),
            result.rules.len()
        ));

        for skipped in &result.files_skipped {
            output.push_str(&format!("    skipped: {}\n", skipped.display()));
        }

        output
    }

    fn format_diagnostics(&self, result: &CheckResult) -> String {
        let mut output = self.section_title("Issues");
        for diagnostic in result.sorted_diagnostics() {
            output.push_str(&self.format_diagnostic(diagnostic));
            output.push('\n');
        }
        output
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let label = diagnostic.severity.to_string();
        let severity = if self.use_colors {
            label.yellow().to_string()
        } else {
            label
        };

        let location = format!("    → {}", diagnostic.range);
        let location = if self.use_colors {
            location.dimmed().to_string()
        } else {
            location
        };

        format!(
            "\n  [{severity}] {} ({})\n{location}\n",
            diagnostic.message, diagnostic.rule
        )
    }

    fn format_rule_table(&self, result: &CheckResult) -> String {
        let mut output = self.section_title("Rules");

        let counts = result.counts_by_rule();
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Rule", "Issues"]);

        for rule in &result.rules {
            let issues = counts.get(rule).copied().unwrap_or(0);
            let cell = Cell::new(issues);
            let cell = match (self.use_colors, issues) {
                (false, _) => cell,
                (true, 0) => cell.fg(Color::Green),
                (true, _) => cell.fg(Color::Yellow),
            };
            table.add_row(vec![Cell::new(rule), cell]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_footer(&self, result: &CheckResult) -> String {
        let status = if result.has_warnings() {
            if self.use_colors {
                "PASSED with warnings".yellow().to_string()
            } else {
                "PASSED with warnings".to_string()
            }
        } else if self.use_colors {
            "PASSED - No issues found".green().to_string()
        } else {
            "PASSED - No issues found".to_string()
        };

        format!("\n{status}\n\n")
    }
}
