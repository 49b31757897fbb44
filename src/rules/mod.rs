//! Lint rules.
//!
//! Each rule walks the documents handed out by a [`Runner`] and reports what
//! it finds through [`Runner::emit_issue`]. Rules hold no mutable state, so
//! running one twice over the same documents yields the same diagnostics.
//!
//! # Rules
//!
//! | Name                       | Checks                                            |
//! |----------------------------|---------------------------------------------------|
//! | `rightmost_operator_rule`  | provider constraints are written as `~> x.y`      |
//! | `aws_module_version_rule`  | module majors match the AWS provider major        |

mod module_version;
mod rightmost_operator;

pub use module_version::ModuleVersionRule;
pub use rightmost_operator::RightmostOperatorRule;

use crate::analyzer::CompatibilityTable;
use crate::config::Config;
use crate::error::Result;
use crate::runner::Runner;
use crate::types::Severity;

/// A named check run against a set of documents.
pub trait Rule: Send + Sync {
    /// Unique rule name, used in diagnostics and for `--rule` selection.
    fn name(&self) -> &'static str;

    /// Whether the rule runs by default.
    fn enabled(&self) -> bool {
        true
    }

    /// Severity attached to every diagnostic of this rule.
    fn severity(&self) -> Severity {
        Severity::Warning
    }

    /// Documentation link, if any.
    fn link(&self) -> Option<&str> {
        None
    }

    /// Run the rule.
    ///
    /// # Errors
    ///
    /// Propagates errors returned by the runner. Problems in the checked
    /// configuration are never errors.
    fn check(&self, runner: &mut dyn Runner) -> Result<()>;
}

/// All built-in rules, in the order they run.
///
/// The compatibility table of the module rule includes the entries from the
/// configuration's `compatibility` section.
#[must_use]
pub fn default_rules(config: &Config) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(RightmostOperatorRule),
        Box::new(ModuleVersionRule::new(CompatibilityTable::with_overrides(config))),
    ]
}

/// Keep only the rules named in `names`; an empty list keeps every enabled rule.
///
/// # Errors
///
/// Returns [`UnknownRule`](crate::error::TidemarkError::UnknownRule) for a
/// name no rule answers to.
pub fn select_rules(rules: Vec<Box<dyn Rule>>, names: &[String]) -> Result<Vec<Box<dyn Rule>>> {
    if names.is_empty() {
        return Ok(rules.into_iter().filter(|rule| rule.enabled()).collect());
    }

    if let Some(unknown) = names
        .iter()
        .find(|name| !rules.iter().any(|rule| rule.name() == name.as_str()))
    {
        return Err(crate::err!(UnknownRule {
            name: unknown.clone(),
        }));
    }

    Ok(rules
        .into_iter()
        .filter(|rule| names.iter().any(|name| name == rule.name()))
        .collect())
}
