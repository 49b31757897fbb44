//! HCL loading for Terraform/OpenTofu files.
//!
//! This module turns `.tf` files into the parser-independent
//! [`Document`] model the rules operate on. Only literal values are
//! evaluated; anything that needs an evaluation context (variables,
//! function calls, interpolations) is kept as an unevaluable expression
//! so rules can skip it.
//!
//! # Example
//!
//! ```rust,no_run
//! use tidemark::parser::HclParser;
//! use tidemark::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let parser = HclParser::new(&config);
//!
//!     let loaded = parser.parse_directory(std::path::Path::new("./terraform")).await?;
//!     println!("Loaded {} files", loaded.documents.len());
//!     Ok(())
//! }
//! ```

pub mod document;
mod hcl;

pub use document::{Attribute, Block, Document, Expression};
pub use hcl::{HclParser, LoadedDocuments};

/// File extensions to scan for Terraform/OpenTofu files.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf"];

/// Files and directories to skip during scanning.
pub const SKIP_FILES: &[&str] = &[".terraform", ".terragrunt-cache", "terraform.tfstate"];

/// Trait for parsing HCL content into a [`Document`].
///
/// This trait allows for different parsing implementations
/// (e.g., for testing with canned documents).
pub trait Parser: Send + Sync {
    /// Parse a single file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the HCL content is invalid.
    fn parse_content(&self, content: &str, file_path: &std::path::Path) -> crate::Result<Document>;
}
