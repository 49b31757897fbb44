//! # Tidemark
//!
//! A version constraint linter for Terraform/OpenTofu.
//!
//! Tidemark loads `.tf` files, runs a small set of rules over them and
//! reports every finding as a [`Diagnostic`](types::Diagnostic) anchored at
//! the offending expression.
//!
//! ## Rules
//!
//! - **`rightmost_operator_rule`**: provider version constraints in
//!   `required_providers` and `provider` blocks must be written as `~> x.y`
//! - **`aws_module_version_rule`**: `terraform-aws-modules` modules must use
//!   a major version that is compatible with the declared AWS provider major
//!
//! ## Example
//!
//! ```rust,no_run
//! use tidemark::{Config, Linter, ReportFormat};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let linter = Linter::new(Config::default());
//!
//!     let result = linter.check_path("./terraform").await?;
//!
//!     let report = result.generate_report(ReportFormat::Text)?;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod rules;
pub mod runner;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TidemarkError};
pub use rules::Rule;
pub use runner::{LocalRunner, Runner};
pub use types::{CheckResult, Diagnostic, ReportFormat, Severity, SourcePos, SourceRange};

use parser::{Document, LoadedDocuments};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

/// Main entry point that loads files and runs the rules over them.
///
/// Every directory holding `.tf` files is one Terraform module; each module
/// gets its own [`LocalRunner`], so a provider declared in one module never
/// leaks into another.
///
/// # Example
///
/// ```rust,no_run
/// use tidemark::{Config, Linter};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let linter = Linter::new(Config::default())
///         .with_rules(&["aws_module_version_rule".to_string()])?;
///
///     let result = linter.check_paths(&["./network", "./storage"]).await?;
///     println!("Found {} issues", result.diagnostics.len());
///     Ok(())
/// }
/// ```
pub struct Linter {
    config: Config,
    rules: Vec<Box<dyn Rule>>,
}

impl Linter {
    /// Create a linter running every default rule.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rules = rules::default_rules(&config);
        Self { config, rules }
    }

    /// Restrict the linter to the named rules. An empty list keeps all rules.
    ///
    /// # Errors
    ///
    /// Returns an error if a name does not match any rule.
    pub fn with_rules(mut self, names: &[String]) -> Result<Self> {
        self.rules = rules::select_rules(self.rules, names)?;
        Ok(self)
    }

    /// Rules this linter runs, in order.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Check a single file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path doesn't exist or isn't accessible
    /// - HCL parsing fails (unless `continue_on_error` is enabled)
    pub async fn check_path<P: AsRef<Path>>(&self, path: P) -> Result<CheckResult> {
        self.check_paths(&[path.as_ref()]).await
    }

    /// Check several files or directories.
    ///
    /// # Errors
    ///
    /// Returns an error if any path fails to load.
    pub async fn check_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CheckResult> {
        let parser = parser::HclParser::new(&self.config);
        let mut loaded = LoadedDocuments::default();

        for path in paths {
            let path = path.as_ref();
            tracing::info!(path = %path.display(), "Checking path");
            loaded.merge(parser.parse_path(path).await?);
        }

        let mut result = self.check_documents(loaded.documents)?;
        result.files_skipped = loaded.skipped;
        Ok(result)
    }

    /// Run the rules over already-parsed documents.
    ///
    /// A file reached through several inputs (`.` and `./net`, or a directory
    /// and a file inside it) is checked once. Modules are grouped by the
    /// normalized directory, so `net/a.tf` and `./net/b.tf` share a module.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule fails. Findings are never errors.
    pub fn check_documents(&self, documents: Vec<Document>) -> Result<CheckResult> {
        let mut seen = BTreeSet::new();
        let mut files_checked = Vec::new();
        let mut modules: BTreeMap<PathBuf, Vec<Document>> = BTreeMap::new();

        for document in documents {
            let key = normalized_path(document.path());
            if !seen.insert(key.clone()) {
                tracing::debug!(file = %document.path().display(), "Skipping duplicate file");
                continue;
            }

            let dir = key.parent().map(Path::to_path_buf).unwrap_or_default();
            files_checked.push(document.path.clone());
            modules.entry(dir).or_default().push(document);
        }

        let mut diagnostics = Vec::new();
        for (dir, documents) in modules {
            tracing::debug!(module = %dir.display(), files = documents.len(), "Checking module");
            let mut runner = LocalRunner::new(documents);
            for rule in &self.rules {
                rule.check(&mut runner)?;
            }
            diagnostics.extend(runner.into_diagnostics());
        }

        tracing::info!(
            files = files_checked.len(),
            issues = diagnostics.len(),
            "Check complete"
        );

        Ok(CheckResult {
            files_checked,
            files_skipped: Vec::new(),
            rules: self.rules.iter().map(|r| r.name().to_string()).collect(),
            diagnostics,
        })
    }
}

/// Canonical path when the file exists, otherwise the path with `.` and
/// `dir/..` components folded away.
fn normalized_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) =>
            {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{HclParser, Parser};

    fn parse(path: &str, content: &str) -> Document {
        HclParser::new(&Config::default())
            .parse_content(content, Path::new(path))
            .unwrap()
    }

    const AWS_5: &str = "terraform {\n  required_providers {\n    aws = {\n      source  = \"hashicorp/aws\"\n      version = \"~> 5.0\"\n    }\n  }\n}\n";
    const VPC_6: &str = "module \"vpc\" {\n  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"~> 6.0\"\n}\n";

    #[test]
    fn test_linter_creation() {
        let linter = Linter::new(Config::default());
        assert_eq!(linter.rules().len(), 2);
    }

    #[test]
    fn test_modules_are_checked_separately() {
        let linter = Linter::new(Config::default());
        let result = linter
            .check_documents(vec![
                parse("net/versions.tf", AWS_5),
                parse("net/main.tf", VPC_6),
                parse("other/main.tf", VPC_6),
            ])
            .unwrap();

        assert_eq!(result.files_checked.len(), 3);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].range.filename, PathBuf::from("net/main.tf"));
    }

    #[test]
    fn test_module_grouping_ignores_path_spelling() {
        let linter = Linter::new(Config::default());
        let result = linter
            .check_documents(vec![
                parse("net/versions.tf", AWS_5),
                parse("./net/main.tf", VPC_6),
            ])
            .unwrap();

        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].range.filename, PathBuf::from("./net/main.tf"));
    }

    #[test]
    fn test_duplicate_documents_are_checked_once() {
        let linter = Linter::new(Config::default());
        let result = linter
            .check_documents(vec![
                parse("net/versions.tf", AWS_5),
                parse("net/main.tf", VPC_6),
                parse("./net/main.tf", VPC_6),
                parse("net/../net/main.tf", VPC_6),
            ])
            .unwrap();

        assert_eq!(
            result.files_checked,
            vec![PathBuf::from("net/versions.tf"), PathBuf::from("net/main.tf")]
        );
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_normalized_path() {
        assert_eq!(normalized_path(Path::new("./net/main.tf")), PathBuf::from("net/main.tf"));
        assert_eq!(
            normalized_path(Path::new("net/../storage/./main.tf")),
            PathBuf::from("storage/main.tf")
        );
        assert_eq!(normalized_path(Path::new("../net/main.tf")), PathBuf::from("../net/main.tf"));
    }

    #[test]
    fn test_with_rules() {
        let linter = Linter::new(Config::default())
            .with_rules(&["rightmost_operator_rule".to_string()])
            .unwrap();
        let result = linter
            .check_documents(vec![parse("main.tf", AWS_5), parse("vpc.tf", VPC_6)])
            .unwrap();

        assert!(result.diagnostics.is_empty());
        assert_eq!(result.rules, vec!["rightmost_operator_rule".to_string()]);
    }

    #[test]
    fn test_unknown_rule() {
        assert!(Linter::new(Config::default())
            .with_rules(&["nope".to_string()])
            .is_err());
    }
}
