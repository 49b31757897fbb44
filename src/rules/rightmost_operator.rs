//! `rightmost_operator_rule`: provider constraints must be `~> x.y`.

use crate::analyzer::{format_violation_message, required_provider_versions, validate_format};
use crate::error::Result;
use crate::parser::{Block, Document};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::types::SourceRange;

/// Checks provider version constraints in `required_providers` entries and
/// in `provider` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RightmostOperatorRule;

impl RightmostOperatorRule {
    fn document_issues(document: &Document, issues: &mut Vec<(String, SourceRange)>) {
        for (attr, version) in required_provider_versions(document) {
            if !validate_format(version) {
                // anchored at the whole object value, as tflint does
                issues.push((
                    format_violation_message(&format!("Provider {}", attr.name), version),
                    attr.expr.range().clone(),
                ));
            }
        }

        for block in document.blocks_of_type("provider") {
            Self::provider_block_issue(block, issues);
        }
    }

    fn provider_block_issue(block: &Block, issues: &mut Vec<(String, SourceRange)>) {
        let Some(name) = block.first_label() else {
            return;
        };
        let Some(attr) = block.attribute("version") else {
            return;
        };
        let Some(version) = attr.expr.as_str() else {
            tracing::debug!(provider = %name, "Provider version is not a literal string, skipping");
            return;
        };

        if !validate_format(version) {
            issues.push((
                format_violation_message(&format!("Provider {name}"), version),
                attr.expr.range().clone(),
            ));
        }
    }
}

impl Rule for RightmostOperatorRule {
    fn name(&self) -> &'static str {
        "rightmost_operator_rule"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<()> {
        let mut issues = Vec::new();
        for document in runner.documents()? {
            Self::document_issues(document, &mut issues);
        }

        tracing::debug!(rule = self.name(), issues = issues.len(), "Rule finished");
        for (message, range) in issues {
            runner.emit_issue(self, message, range)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TidemarkError;
    use crate::rules::test_support::{documents, run, FailingRunner};
    use pretty_assertions::assert_eq;

    fn message(subject: &str, raw: &str) -> String {
        format!(
            "{subject} version constraint should use '~> x.y' format where x is the major \
             version and y is the minor version (no patch version), got: {raw}"
        )
    }

    /// `(message, start line, start column, end line, end column)` for each diagnostic.
    fn summarize(content: &str) -> Vec<(String, usize, usize, usize, usize)> {
        run(&RightmostOperatorRule, &[("resource.tf", content)])
            .into_iter()
            .map(|d| {
                (
                    d.message,
                    d.range.start.line,
                    d.range.start.column,
                    d.range.end.line,
                    d.range.end.column,
                )
            })
            .collect()
    }

    #[test]
    fn test_valid_required_providers() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 4.0"
    }
    azurerm = {
      source  = "hashicorp/azurerm"
      version = "~> 3.0"
    }
  }
}"#;
        assert!(summarize(content).is_empty());
    }

    #[test]
    fn test_patch_version_in_required_providers() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 4.1.2"
    }
  }
}"#;
        assert_eq!(
            summarize(content),
            vec![(message("Provider aws", "~> 4.1.2"), 4, 11, 7, 6)]
        );
    }

    #[test]
    fn test_greater_or_equal_in_required_providers() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = ">= 4.0"
    }
  }
}"#;
        assert_eq!(
            summarize(content),
            vec![(message("Provider aws", ">= 4.0"), 4, 11, 7, 6)]
        );
    }

    #[test]
    fn test_provider_block() {
        let valid = r#"
provider "aws" {
  version = "~> 4.0"
  region  = "us-east-1"
}"#;
        assert!(summarize(valid).is_empty());

        let invalid = r#"
provider "aws" {
  version = ">= 4.0"
  region  = "us-east-1"
}"#;
        assert_eq!(
            summarize(invalid),
            vec![(message("Provider aws", ">= 4.0"), 3, 13, 3, 21)]
        );
    }

    #[test]
    fn test_literal_heredoc_version() {
        let content = "provider \"aws\" {\n  version = <<EOT\n>= 4.0\nEOT\n}\n";
        let found = summarize(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, message("Provider aws", ">= 4.0\n"));
        assert_eq!((found[0].1, found[0].2), (2, 13));

        let valid = "provider \"aws\" {\n  version = <<-EOT\n    ~> 4.0\n  EOT\n}\n";
        assert!(summarize(valid).is_empty());
    }

    #[test]
    fn test_mixed_providers_in_source_order() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 4.0"
    }
    google = {
      source  = "hashicorp/google"
      version = ">= 3.0"
    }
    azurerm = {
      source  = "hashicorp/azurerm"
      version = "3.10.0"
    }
  }
}"#;
        assert_eq!(
            summarize(content),
            vec![
                (message("Provider google", ">= 3.0"), 8, 14, 11, 6),
                (message("Provider azurerm", "3.10.0"), 12, 15, 15, 6),
            ]
        );
    }

    #[test]
    fn test_skipped_values() {
        let content = r#"
variable "aws_version" {
  type = string
}

terraform {
  required_providers {
    aws = {
      source = "hashicorp/aws"
    }
    random = ">= 3.0"
    null = {
      source  = "hashicorp/null"
      version = null
    }
  }
}

provider "google" {
  version = var.google_version
}

provider "azurerm" {
  features {}
}

provider {
  version = ">= 1.0"
}"#;
        assert!(summarize(content).is_empty());
    }

    #[test]
    fn test_spacing_variants_are_valid() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~>4.0"
    }
    google = {
      source  = "hashicorp/google"
      version = "  ~>   5.12  "
    }
  }
}"#;
        assert!(summarize(content).is_empty());
    }

    #[test]
    fn test_multiple_documents() {
        let diagnostics = run(
            &RightmostOperatorRule,
            &[
                ("b.tf", "provider \"aws\" {\n  version = \"5.0.0\"\n}\n"),
                ("a.tf", "provider \"google\" {\n  version = \"~> 5.0.1\"\n}\n"),
            ],
        );
        let files: Vec<_> = diagnostics
            .iter()
            .map(|d| d.range.filename.to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a.tf", "b.tf"]);
    }

    #[test]
    fn test_idempotent() {
        let content = "provider \"aws\" {\n  version = \">= 4.0\"\n}\n";
        let first = run(&RightmostOperatorRule, &[("main.tf", content)]);
        let second = run(&RightmostOperatorRule, &[("main.tf", content)]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_runner_errors_propagate() {
        let mut runner = FailingRunner {
            fail_documents: true,
            documents: Vec::new(),
        };
        assert!(matches!(
            RightmostOperatorRule.check(&mut runner),
            Err(TidemarkError::Internal { .. })
        ));

        let mut runner = FailingRunner {
            fail_documents: false,
            documents: documents(&[("main.tf", "provider \"aws\" {\n  version = \">= 4.0\"\n}\n")]),
        };
        assert!(matches!(
            RightmostOperatorRule.check(&mut runner),
            Err(TidemarkError::Internal { .. })
        ));
    }
}
