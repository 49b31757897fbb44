//! HCL file parser implementation.
//!
//! Parsing uses `hcl-edit`, which keeps byte spans for every expression so
//! diagnostics can point at the exact attribute value. Literal values are
//! converted into `hcl::Value`.

use crate::config::Config;
use crate::error::{Result, ResultExt};
use crate::parser::document::{Attribute, Block, Document, Expression};
use crate::parser::{Parser, SKIP_FILES, TERRAFORM_EXTENSIONS};
use crate::types::{SourcePos, SourceRange};

use ::hcl::Value;
use hcl_edit::expr::{Expression as HclExpression, ObjectKey};
use hcl_edit::structure::{Block as HclBlock, BlockLabel, Body, Structure};
use hcl_edit::template::Template;
use hcl_edit::Span;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents loaded from one or more paths.
#[derive(Debug, Clone, Default)]
pub struct LoadedDocuments {
    /// Parsed documents, ordered by path within each scanned root
    pub documents: Vec<Document>,
    /// Files that failed to load and were skipped
    pub skipped: Vec<PathBuf>,
}

impl LoadedDocuments {
    /// Merge another set of loaded documents into this one.
    pub fn merge(&mut self, other: Self) {
        self.documents.extend(other.documents);
        self.skipped.extend(other.skipped);
    }
}

/// HCL parser for Terraform/OpenTofu files.
///
/// The parser walks directories, reads `.tf` files, and converts them into
/// [`Document`]s.
pub struct HclParser {
    /// Configuration for parsing behavior
    config: Config,
}

impl HclParser {
    /// Create a new HCL parser with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Load a file or every Terraform file below a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or a file fails to load
    /// (unless `continue_on_error` is enabled).
    pub async fn parse_path(&self, path: &Path) -> Result<LoadedDocuments> {
        if path.is_file() {
            let document = self.parse_file(path).await?;
            return Ok(LoadedDocuments {
                documents: vec![document],
                skipped: Vec::new(),
            });
        }
        self.parse_directory(path).await
    }

    /// Parse all Terraform files in a directory.
    ///
    /// Recursively walks the directory tree in file-name order and parses all
    /// `.tf` files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist or if parsing fails
    /// for any file (unless `continue_on_error` is enabled in config).
    pub async fn parse_directory(&self, path: &Path) -> Result<LoadedDocuments> {
        if !path.exists() {
            return Err(crate::err!(DirectoryNotFound {
                path: path.to_path_buf(),
            }));
        }

        let mut result = LoadedDocuments::default();

        for entry in WalkDir::new(path)
            .follow_links(true)
            .max_depth(self.config.scan.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_skip(path, e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };

            let file_path = entry.path();

            if file_path.is_dir() || !self.is_terraform_file(file_path) {
                continue;
            }

            tracing::debug!(file = %file_path.display(), "Parsing file");

            match self.parse_file(file_path).await {
                Ok(document) => result.documents.push(document),
                Err(e) => {
                    if self.config.scan.continue_on_error && e.is_recoverable() {
                        tracing::warn!(
                            file = %file_path.display(),
                            "failed to parse file, continuing: {}",
                            e
                        );
                        result.skipped.push(file_path.to_path_buf());
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        tracing::info!(
            files = result.documents.len(),
            skipped = result.skipped.len(),
            "Loading complete"
        );

        Ok(result)
    }

    /// Parse a single Terraform file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn parse_file(&self, path: &Path) -> Result<Document> {
        let content = tokio::fs::read_to_string(path).await.with_path(path)?;
        self.parse_content(&content, path)
    }

    /// Check if a path below `root` should be skipped.
    fn should_skip(&self, root: &Path, path: &Path) -> bool {
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.starts_with('.') {
                tracing::debug!(path = %path.display(), reason = "hidden file/directory", "Skipping path");
                return true;
            }

            if SKIP_FILES.iter().any(|s| file_name == *s) {
                tracing::debug!(path = %path.display(), reason = "known skip file", "Skipping path");
                return true;
            }

            let relative = path.strip_prefix(root).unwrap_or(path).to_string_lossy();
            if self.config.scan.exclude_patterns.iter().any(|pattern| {
                glob::Pattern::new(pattern)
                    .map(|p| p.matches(file_name) || p.matches(&relative))
                    .unwrap_or(false)
            }) {
                tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
                return true;
            }
        }

        false
    }

    /// Check if a file is a Terraform file.
    fn is_terraform_file(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        TERRAFORM_EXTENSIONS
            .iter()
            .any(|ext| path_str.ends_with(ext))
    }
}

impl Parser for HclParser {
    fn parse_content(&self, content: &str, file_path: &Path) -> Result<Document> {
        let body = hcl_edit::parser::parse_body(content).map_err(|e| {
            crate::err!(HclParse {
                file: file_path.to_path_buf(),
                message: e.to_string(),
                line: Some(e.location().line()),
                column: Some(e.location().column()),
            })
        })?;

        let source = SourceMap::new(content, file_path);
        Ok(Document::new(file_path, convert_body(&body, &source).1))
    }
}

/// Maps byte offsets of one file to line/column positions.
struct SourceMap<'a> {
    content: &'a str,
    file: &'a Path,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    fn new(content: &'a str, file: &'a Path) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            content,
            file,
            line_starts,
        }
    }

    fn pos(&self, byte: usize) -> SourcePos {
        let byte = byte.min(self.content.len());
        let line_index = self.line_starts.partition_point(|&start| start <= byte) - 1;
        let line_start = self.line_starts[line_index];
        let column = self
            .content
            .get(line_start..byte)
            .map_or(byte - line_start, |prefix| prefix.chars().count());
        SourcePos::new(line_index + 1, column + 1, byte)
    }

    fn range(&self, span: Option<std::ops::Range<usize>>) -> SourceRange {
        let span = span.unwrap_or(0..0);
        SourceRange::new(self.file, self.pos(span.start), self.pos(span.end))
    }
}

/// Convert a body into attributes and nested blocks.
fn convert_body(body: &Body, source: &SourceMap<'_>) -> (Vec<Attribute>, Vec<Block>) {
    let mut attributes = Vec::new();
    let mut blocks = Vec::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                attributes.push(Attribute::new(
                    attr.key.value().as_str(),
                    convert_expression(&attr.value, source),
                ));
            }
            Structure::Block(block) => blocks.push(convert_block(block, source)),
        }
    }

    (attributes, blocks)
}

fn convert_block(block: &HclBlock, source: &SourceMap<'_>) -> Block {
    let (attributes, blocks) = convert_body(&block.body, source);
    Block {
        block_type: block.ident.value().as_str().to_string(),
        labels: block
            .labels
            .iter()
            .map(|label| match label {
                BlockLabel::Ident(ident) => ident.value().as_str().to_string(),
                BlockLabel::String(s) => s.value().clone(),
            })
            .collect(),
        attributes,
        blocks,
    }
}

fn convert_expression(expr: &HclExpression, source: &SourceMap<'_>) -> Expression {
    let range = source.range(expr.span());
    match evaluate(expr) {
        Some(value) => Expression::literal(value, range),
        None => Expression::unevaluable(range),
    }
}

/// Evaluate an expression without any evaluation context.
///
/// Returns `None` as soon as any part of the expression needs one.
fn evaluate(expr: &HclExpression) -> Option<Value> {
    match expr {
        HclExpression::Null(_) => Some(Value::Null),
        HclExpression::Bool(b) => Some(Value::Bool(*b.value())),
        HclExpression::Number(n) => number_value(n.value()),
        HclExpression::String(s) => Some(Value::String(s.value().clone())),
        HclExpression::Array(array) => array
            .iter()
            .map(evaluate)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        HclExpression::Object(object) => {
            let mut map = ::hcl::Map::new();
            for (key, value) in object.iter() {
                map.insert(object_key(key)?, evaluate(value.expr())?);
            }
            Some(Value::Object(map))
        }
        HclExpression::Parenthesis(inner) => evaluate(inner.inner()),
        HclExpression::StringTemplate(template) => literal_template(template),
        HclExpression::HeredocTemplate(heredoc) => literal_template(&heredoc.template),
        _ => None,
    }
}

/// A template without interpolations or directives evaluates to its text.
/// `<<-` heredocs arrive already dedented from the parser.
fn literal_template(template: &Template) -> Option<Value> {
    template
        .iter()
        .map(|element| element.as_literal().map(|literal| literal.value().as_str()))
        .collect::<Option<String>>()
        .map(Value::String)
}

fn number_value(n: &hcl_edit::Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return Some(Value::Number(::hcl::Number::from(i)));
    }
    if let Some(u) = n.as_u64() {
        return Some(Value::Number(::hcl::Number::from(u)));
    }
    n.as_f64()
        .and_then(::hcl::Number::from_f64)
        .map(Value::Number)
}

fn object_key(key: &ObjectKey) -> Option<String> {
    match key {
        ObjectKey::Ident(ident) => Some(ident.value().as_str().to_string()),
        ObjectKey::Expression(expr) => match evaluate(expr)? {
            Value::String(s) => Some(s),
            _ => None,
        },
    }
}
