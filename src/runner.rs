//! The boundary between rules and the host that feeds them.
//!
//! A rule never loads files or formats output itself. It asks a [`Runner`]
//! for the parsed documents and hands every issue it finds back to it.

use crate::error::Result;
use crate::parser::Document;
use crate::rules::Rule;
use crate::types::{Diagnostic, SourceRange};

/// Host services available to a rule during a check.
pub trait Runner {
    /// Parsed documents of the module under check, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the documents could not be provided. Rules
    /// propagate it unchanged.
    fn documents(&self) -> Result<&[Document]>;

    /// Record an issue found by `rule` at `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host failed to record the issue. Rules
    /// propagate it unchanged.
    fn emit_issue(&mut self, rule: &dyn Rule, message: String, range: SourceRange) -> Result<()>;
}

/// In-process runner over already-loaded documents.
#[derive(Debug, Default)]
pub struct LocalRunner {
    documents: Vec<Document>,
    diagnostics: Vec<Diagnostic>,
}

impl LocalRunner {
    /// Create a runner over the given documents.
    ///
    /// Documents are sorted by path so every rule sees the same order.
    #[must_use]
    pub fn new(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            documents,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics emitted so far, in emission order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the runner and return its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Runner for LocalRunner {
    fn documents(&self) -> Result<&[Document]> {
        Ok(&self.documents)
    }

    fn emit_issue(&mut self, rule: &dyn Rule, message: String, range: SourceRange) -> Result<()> {
        tracing::debug!(rule = rule.name(), location = %range, "Issue emitted");
        self.diagnostics.push(Diagnostic {
            rule: rule.name().to_string(),
            severity: rule.severity(),
            message,
            range,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RightmostOperatorRule;
    use crate::types::{Severity, SourcePos};

    #[test]
    fn test_documents_sorted_by_path() {
        let runner = LocalRunner::new(vec![
            Document::new("b/main.tf", Vec::new()),
            Document::new("a/versions.tf", Vec::new()),
            Document::new("a/main.tf", Vec::new()),
        ]);
        let paths: Vec<_> = runner
            .documents()
            .unwrap()
            .iter()
            .map(|d| d.path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["a/main.tf", "a/versions.tf", "b/main.tf"]);
    }

    #[test]
    fn test_emit_issue_records_rule_metadata() {
        let mut runner = LocalRunner::default();
        let range = SourceRange::new("main.tf", SourcePos::new(3, 13, 40), SourcePos::new(3, 21, 48));
        runner
            .emit_issue(&RightmostOperatorRule, "bad constraint".to_string(), range.clone())
            .unwrap();

        let diagnostics = runner.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "rightmost_operator_rule");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].message, "bad constraint");
        assert_eq!(diagnostics[0].range, range);
    }
}
