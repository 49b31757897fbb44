//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `check`: Lint Terraform files
//! - `rules`: List the available rules
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Check the current directory
//! tidemark check
//!
//! # Check several module directories, failing on any warning
//! tidemark check ./modules/network ./modules/storage --strict
//!
//! # Generate JSON report
//! tidemark check ./terraform --format json --output report.json
//!
//! # Run a single rule
//! tidemark check ./terraform --rule aws_module_version_rule
//!
//! # Initialize configuration
//! tidemark init
//!
//! # Validate configuration
//! tidemark validate tidemark.yaml
//! ```

use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tidemark - version constraint linter for Terraform/OpenTofu.
#[derive(Parser, Debug)]
#[command(
    name = "tidemark",
    author,
    version,
    about = "Version constraint linter for Terraform/OpenTofu",
    long_about = "Tidemark checks that provider and module version constraints use the \
                  '~> x.y' form and that terraform-aws-modules modules are pinned to a major \
                  version compatible with the declared AWS provider."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TIDEMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint Terraform/OpenTofu files
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// List available rules
    Rules,

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files or directories to check (current directory if omitted)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when any diagnostic is reported
    #[arg(long)]
    pub strict: bool,

    /// Continue checking even if some files fail to parse
    #[arg(long)]
    pub continue_on_error: bool,

    /// Maximum depth for recursive directory scanning
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Run only the named rule (repeatable)
    #[arg(short, long = "rule", value_name = "NAME")]
    pub rules: Vec<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl CheckArgs {
    /// Paths to check, defaulting to the current directory.
    #[must_use]
    pub fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tidemark.yaml")]
    pub config: PathBuf,
}
