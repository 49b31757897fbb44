//! Parser-independent document model.
//!
//! Rules only ever see these types. A [`Document`] is an ordered list of
//! blocks; each [`Block`] has a type tag, labels, attributes and nested
//! blocks. Attribute values are carried as an [`Expression`]: the literal
//! value the expression evaluates to (if it evaluates at all) and the range
//! it occupies in the source file.

use crate::types::SourceRange;
use hcl::Value;
use std::path::{Path, PathBuf};

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path of the file the document was read from
    pub path: PathBuf,
    /// Top-level blocks in source order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a document from its blocks.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, blocks: Vec<Block>) -> Self {
        Self {
            path: path.into(),
            blocks,
        }
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level blocks with the given type tag, in source order.
    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |block| block.block_type == block_type)
    }
}

/// A block such as `terraform { ... }` or `module "vpc" { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block type tag (`terraform`, `provider`, `module`, ...)
    pub block_type: String,
    /// Labels in source order
    pub labels: Vec<String>,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order
    pub blocks: Vec<Block>,
}

impl Block {
    /// Create an empty block with the given type tag.
    #[must_use]
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            labels: Vec::new(),
            attributes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Add a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a nested block.
    #[must_use]
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// First label, if any.
    #[must_use]
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Nested blocks with the given type tag, in source order.
    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |block| block.block_type == block_type)
    }
}

/// A `name = expression` pair inside a block body.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute value
    pub expr: Expression,
}

impl Attribute {
    /// Create a new attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, expr: Expression) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// An attribute value together with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    value: Option<Value>,
    range: SourceRange,
}

impl Expression {
    /// An expression that evaluated to a literal value.
    #[must_use]
    pub fn literal(value: impl Into<Value>, range: SourceRange) -> Self {
        Self {
            value: Some(value.into()),
            range,
        }
    }

    /// An expression that cannot be evaluated without context
    /// (variable references, function calls, interpolations, ...).
    #[must_use]
    pub fn unevaluable(range: SourceRange) -> Self {
        Self { value: None, range }
    }

    /// The evaluated value, or `None` if evaluation failed.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The value as a string, if it evaluated to one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.value() {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The non-null string stored under `key`, if the value is an object.
    #[must_use]
    pub fn object_str(&self, key: &str) -> Option<&str> {
        match self.value() {
            Some(Value::Object(object)) => match object.get(key) {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// Source range of the expression.
    #[must_use]
    pub fn range(&self) -> &SourceRange {
        &self.range
    }
}
