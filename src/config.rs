//! Configuration module for Tidemark.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tidemark.yaml`)
//! - Environment variables (`${VAR}` expansion inside the file)
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tidemark.yaml
//!
//! # Scanning options
//! scan:
//!   exclude_patterns:
//!     - "examples/**"
//!   continue_on_error: true
//!   max_depth: 100
//!
//! # Output options
//! output:
//!   colored: true
//!   pretty: true
//!
//! # Extra module compatibility entries
//! compatibility:
//!   "terraform-aws-modules/eks/aws":
//!     - provider: 5
//!       module: 20
//! ```

use crate::analyzer::CompatibilityEntry;
use crate::error::{Result, TidemarkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Default configuration file names looked up in the working directory.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tidemark.yaml", "tidemark.yml", ".tidemark.yaml"];

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Patterns to exclude from scanning (glob patterns, matched against the
    /// file name and the path relative to the scanned root).
    pub exclude_patterns: Vec<String>,

    /// Continue checking even if some files fail to parse.
    pub continue_on_error: bool,

    /// Maximum depth for recursive directory scanning.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            continue_on_error: false,
            max_depth: default_max_depth(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanning options
    pub scan: ScanOptions,

    /// Output options
    pub output: OutputOptions,

    /// Module compatibility entries, keyed by module source. A source listed
    /// here replaces the built-in entries for that source.
    pub compatibility: BTreeMap<String, Vec<CompatibilityEntry>>,
}

fn default_max_depth() -> usize {
    100
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value fails validation.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Self = serde_yaml::from_str(&expanded).map_err(|e| {
            TidemarkError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;
        config.validate()?;

        tracing::debug!(
            exclude_patterns = config.scan.exclude_patterns.len(),
            continue_on_error = config.scan.continue_on_error,
            compatibility_sources = config.compatibility.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading configuration from file");
        let content = std::fs::read_to_string(path)
            .map_err(|e| TidemarkError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Find the configuration file to use when none was given explicitly.
    ///
    /// Looks in the working directory first, then in the user configuration
    /// directory (`<config dir>/tidemark/config.yaml`).
    #[must_use]
    pub fn discover() -> Option<PathBuf> {
        for name in DEFAULT_CONFIG_FILES {
            let path = Path::new(name);
            if path.exists() {
                tracing::debug!(path = %name, "Found configuration file");
                return Some(path.to_path_buf());
            }
        }

        dirs::config_dir()
            .map(|dir| dir.join("tidemark").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid glob patterns, a zero scan depth or an
    /// empty compatibility list.
    pub fn validate(&self) -> Result<()> {
        if self.scan.max_depth == 0 {
            return Err(crate::err!(ConfigValue {
                key: "scan.max_depth".to_string(),
                message: "must be greater than zero".to_string(),
            }));
        }

        for pattern in &self.scan.exclude_patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(crate::err!(ConfigValue {
                    key: "scan.exclude_patterns".to_string(),
                    message: format!("invalid glob pattern '{pattern}': {e}"),
                }));
            }
        }

        for (source, entries) in &self.compatibility {
            if entries.is_empty() {
                return Err(crate::err!(ConfigValue {
                    key: format!("compatibility.{source}"),
                    message: "must list at least one provider/module pair".to_string(),
                }));
            }
        }

        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# Tidemark Configuration File

# Scanning options
scan:
  # Patterns to exclude from scanning (glob patterns)
  exclude_patterns:
    - "examples/**"
    - "*_override.tf"

  # Continue checking even if some files fail to parse
  continue_on_error: false

  # Maximum depth for recursive directory scanning
  max_depth: 100

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Pretty-print JSON output
  pretty: true

# Extra module compatibility entries for aws_module_version_rule.
# Each entry pairs an AWS provider major version with the module major
# version meant to be used with it. A source listed here replaces the
# built-in entries for that source.
compatibility: {}
  # "terraform-aws-modules/eks/aws":
  #   - provider: 5
  #     module: 20
  #   - provider: 6
  #     module: 21
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::CheckArgs) {
        if !args.exclude_patterns.is_empty() {
            self.scan
                .exclude_patterns
                .extend(args.exclude_patterns.iter().cloned());
        }
        if args.continue_on_error {
            self.scan.continue_on_error = true;
        }
        if let Some(max_depth) = args.max_depth {
            self.scan.max_depth = max_depth;
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

static BRACED_VAR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

static BARE_VAR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in BRACED_VAR.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    let braced_done = result.clone();
    for cap in BARE_VAR.captures_iter(&braced_done) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
