//! `aws_module_version_rule`: module majors must match the AWS provider major.

use crate::analyzer::{
    extract_major, find_provider_version, format_violation_message, validate_format,
    CompatibilityTable, AWS_PROVIDER,
};
use crate::error::Result;
use crate::parser::{Block, Document};
use crate::rules::Rule;
use crate::runner::Runner;
use crate::types::SourceRange;

/// Checks `terraform-aws-modules` module blocks against the AWS provider
/// constraint declared in `required_providers`.
///
/// Only modules whose `source` is governed by the compatibility table are
/// inspected. Without an AWS provider declaration the rule does nothing.
#[derive(Debug, Clone)]
pub struct ModuleVersionRule {
    table: CompatibilityTable,
}

impl Default for ModuleVersionRule {
    fn default() -> Self {
        Self::new(CompatibilityTable::builtin().clone())
    }
}

impl ModuleVersionRule {
    /// Create the rule over a compatibility table.
    #[must_use]
    pub fn new(table: CompatibilityTable) -> Self {
        Self { table }
    }

    /// The table the rule checks against.
    #[must_use]
    pub fn table(&self) -> &CompatibilityTable {
        &self.table
    }

    fn module_issues(
        &self,
        block: &Block,
        aws_version: &str,
        issues: &mut Vec<(String, SourceRange)>,
    ) {
        let Some(source_attr) = block.attribute("source") else {
            return;
        };
        let Some(source) = source_attr.expr.as_str() else {
            return;
        };
        if !self.table.contains(source) {
            return;
        }

        let Some(version_attr) = block.attribute("version") else {
            issues.push((
                format!("Module {source} should specify a version constraint"),
                source_attr.expr.range().clone(),
            ));
            return;
        };
        let Some(module_version) = version_attr.expr.as_str() else {
            tracing::debug!(source = %source, "Module version is not a literal string, skipping");
            return;
        };
        let range = version_attr.expr.range();

        if !validate_format(module_version) {
            issues.push((
                format_violation_message(&format!("Module {source}"), module_version),
                range.clone(),
            ));
        }

        let (Some(module_major), Some(provider_major)) =
            (extract_major(module_version), extract_major(aws_version))
        else {
            tracing::debug!(
                source = %source,
                module_version = %module_version,
                aws_version = %aws_version,
                "Major version not extractable, skipping compatibility check"
            );
            return;
        };

        if self.table.is_compatible(source, provider_major, module_major) {
            return;
        }

        let message = match self.table.recommended_module_major(source, provider_major) {
            Some(recommended) => format!(
                "Module {source} version ~> {module_major}.0 is not compatible with AWS provider \
                 version {aws_version}. Use module version ~> {recommended}.0 for AWS provider \
                 ~> {provider_major}.0"
            ),
            None => format!(
                "Module {source} version ~> {module_major}.0 does not have a known compatibility \
                 mapping for AWS provider version {aws_version}"
            ),
        };
        issues.push((message, range.clone()));
    }

    fn document_issues(
        &self,
        document: &Document,
        aws_version: &str,
        issues: &mut Vec<(String, SourceRange)>,
    ) {
        for block in document.blocks_of_type("module") {
            self.module_issues(block, aws_version, issues);
        }
    }
}

impl Rule for ModuleVersionRule {
    fn name(&self) -> &'static str {
        "aws_module_version_rule"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<()> {
        let mut issues = Vec::new();
        {
            let documents = runner.documents()?;
            let Some(aws_version) = find_provider_version(documents, AWS_PROVIDER) else {
                tracing::debug!(rule = self.name(), "No AWS provider version declared, skipping");
                return Ok(());
            };

            for document in documents {
                self.document_issues(document, aws_version, &mut issues);
            }
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
    use crate::analyzer::CompatibilityEntry;
    use crate::error::TidemarkError;
    use crate::rules::test_support::{documents, run, FailingRunner};
    use crate::types::Diagnostic;
    use pretty_assertions::assert_eq;

    const AWS_5: &str = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}
"#;

    fn with_module(provider: &str, name: &str, body: &str) -> String {
        format!("{provider}\nmodule \"{name}\" {{\n{body}\n}}")
    }

    fn check(content: &str) -> Vec<Diagnostic> {
        run(&ModuleVersionRule::default(), &[("resource.tf", content)])
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    fn span(diagnostic: &Diagnostic) -> (usize, usize, usize, usize) {
        let r = &diagnostic.range;
        (r.start.line, r.start.column, r.end.line, r.end.column)
    }

    #[test]
    fn test_compatible_module() {
        let content = with_module(
            AWS_5.trim_end(),
            "s3_bucket",
            "  source  = \"terraform-aws-modules/s3-bucket/aws\"\n  version = \"~> 4.0\"",
        );
        assert!(check(&content).is_empty());
    }

    #[test]
    fn test_incompatible_module() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

module "s3_bucket" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 5.0"
}"#;
        let diagnostics = check(content);
        assert_eq!(
            messages(&diagnostics),
            vec![
                "Module terraform-aws-modules/s3-bucket/aws version ~> 5.0 is not compatible with \
                 AWS provider version ~> 5.0. Use module version ~> 4.0 for AWS provider ~> 5.0"
            ]
        );
        assert_eq!(span(&diagnostics[0]), (13, 13, 13, 21));
        assert_eq!(diagnostics[0].rule, "aws_module_version_rule");
    }

    #[test]
    fn test_missing_version() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

module "s3_bucket" {
  source = "terraform-aws-modules/s3-bucket/aws"
}"#;
        let diagnostics = check(content);
        assert_eq!(
            messages(&diagnostics),
            vec!["Module terraform-aws-modules/s3-bucket/aws should specify a version constraint"]
        );
        assert_eq!(span(&diagnostics[0]), (12, 12, 12, 49));
    }

    #[test]
    fn test_bad_operator_only_reports_format() {
        let content = with_module(
            AWS_5.trim_end(),
            "s3_bucket",
            "  source  = \"terraform-aws-modules/s3-bucket/aws\"\n  version = \">= 4.0\"",
        );
        assert_eq!(
            messages(&check(&content)),
            vec![
                "Module terraform-aws-modules/s3-bucket/aws version constraint should use '~> x.y' \
                 format where x is the major version and y is the minor version (no patch \
                 version), got: >= 4.0"
            ]
        );
    }

    #[test]
    fn test_heredoc_versions_are_checked() {
        let compatible = with_module(
            AWS_5.trim_end(),
            "s3_bucket",
            "  source  = \"terraform-aws-modules/s3-bucket/aws\"\n  version = <<-EOT\n    ~> 4.0\n    EOT",
        );
        assert!(check(&compatible).is_empty());

        let bad_operator = with_module(
            AWS_5.trim_end(),
            "s3_bucket",
            "  source  = \"terraform-aws-modules/s3-bucket/aws\"\n  version = <<EOT\n>= 4.0\nEOT",
        );
        assert_eq!(
            messages(&check(&bad_operator)),
            vec![
                "Module terraform-aws-modules/s3-bucket/aws version constraint should use '~> x.y' \
                 format where x is the major version and y is the minor version (no patch \
                 version), got: >= 4.0\n"
            ]
        );
    }

    #[test]
    fn test_patch_version_compatible_major() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

module "s3_bucket" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 4.1.2"
}"#;
        let diagnostics = check(content);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.ends_with("got: ~> 4.1.2"));
        assert_eq!(span(&diagnostics[0]), (13, 13, 13, 23));
    }

    #[test]
    fn test_patch_version_incompatible_major_reports_both() {
        let content = with_module(
            AWS_5.trim_end(),
            "vpc",
            "  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"~> 6.1.0\"",
        );
        let diagnostics = check(&content);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.ends_with("got: ~> 6.1.0"));
        assert_eq!(
            diagnostics[1].message,
            "Module terraform-aws-modules/vpc/aws version ~> 6.0 is not compatible with AWS \
             provider version ~> 5.0. Use module version ~> 5.0 for AWS provider ~> 5.0"
        );
        assert_eq!(diagnostics[0].range, diagnostics[1].range);
    }

    #[test]
    fn test_unknown_provider_major() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 4.0"
    }
  }
}

module "s3_bucket" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 3.0"
}"#;
        assert_eq!(
            messages(&check(content)),
            vec![
                "Module terraform-aws-modules/s3-bucket/aws version ~> 3.0 does not have a known \
                 compatibility mapping for AWS provider version ~> 4.0"
            ]
        );
    }

    #[test]
    fn test_provider_constraint_without_major() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = ">= 5.0"
    }
  }
}

module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "~> 1.0"
}"#;
        assert!(check(content).is_empty());
    }

    #[test]
    fn test_no_aws_provider() {
        let content = r#"
module "s3_bucket" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 1.0"
}"#;
        assert!(check(content).is_empty());
    }

    #[test]
    fn test_ungoverned_and_unevaluable_modules_skipped() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

module "custom" {
  source  = "./modules/custom"
  version = "1.0.0"
}

module "dynamic_source" {
  source = var.module_source
}

module "dynamic_version" {
  source  = "terraform-aws-modules/vpc/aws"
  version = var.vpc_version
}

module "numeric_version" {
  source  = "terraform-aws-modules/lambda/aws"
  version = 7
}"#;
        assert!(check(content).is_empty());
    }

    #[test]
    fn test_mixed_modules_in_source_order() {
        let content = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 6.0"
    }
  }
}

module "s3_bucket" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 5.0"
}

module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "~> 5.0"
}

module "lambda" {
  source  = "terraform-aws-modules/lambda/aws"
  version = "~> 7.0"
}"#;
        assert_eq!(
            messages(&check(content)),
            vec![
                "Module terraform-aws-modules/vpc/aws version ~> 5.0 is not compatible with AWS \
                 provider version ~> 6.0. Use module version ~> 6.0 for AWS provider ~> 6.0",
                "Module terraform-aws-modules/lambda/aws version ~> 7.0 is not compatible with \
                 AWS provider version ~> 6.0. Use module version ~> 8.0 for AWS provider ~> 6.0",
            ]
        );
    }

    #[test]
    fn test_provider_declared_in_another_file() {
        let diagnostics = run(
            &ModuleVersionRule::default(),
            &[
                ("versions.tf", AWS_5),
                (
                    "main.tf",
                    "module \"lambda\" {\n  source  = \"terraform-aws-modules/lambda/aws\"\n  version = \"~> 8.0\"\n}\n",
                ),
            ],
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.filename.to_string_lossy(), "main.tf");
        assert_eq!(span(&diagnostics[0]), (3, 13, 3, 21));
    }

    #[test]
    fn test_custom_table() {
        let table = CompatibilityTable::from_entries([(
            "terraform-aws-modules/eks/aws".to_string(),
            vec![CompatibilityEntry::new(5, 20)],
        )]);
        let rule = ModuleVersionRule::new(table);
        let content = with_module(
            AWS_5.trim_end(),
            "eks",
            "  source  = \"terraform-aws-modules/eks/aws\"\n  version = \"~> 19.0\"",
        );
        let diagnostics = run(&rule, &[("main.tf", content.as_str())]);
        assert_eq!(
            messages(&diagnostics),
            vec![
                "Module terraform-aws-modules/eks/aws version ~> 19.0 is not compatible with AWS \
                 provider version ~> 5.0. Use module version ~> 20.0 for AWS provider ~> 5.0"
            ]
        );
    }

    #[test]
    fn test_runner_errors_propagate() {
        let mut runner = FailingRunner {
            fail_documents: true,
            documents: Vec::new(),
        };
        assert!(matches!(
            ModuleVersionRule::default().check(&mut runner),
            Err(TidemarkError::Internal { .. })
        ));

        let content = with_module(
            AWS_5.trim_end(),
            "vpc",
            "  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"~> 6.0\"",
        );
        let mut runner = FailingRunner {
            fail_documents: false,
            documents: documents(&[("main.tf", content.as_str())]),
        };
        assert!(matches!(
            ModuleVersionRule::default().check(&mut runner),
            Err(TidemarkError::Internal { .. })
        ));
    }
}
