//! Version constraint shape checks.
//!
//! House convention: constraints use the pessimistic operator with
//! `major.minor` precision only, e.g. `~> 5.0`. Format validation and
//! major version extraction are separate on purpose: `~> 4.1.2` fails the
//! format check but still has a usable major version.

use regex::Regex;
use std::sync::LazyLock;

// ASCII classes only: Terraform rejects non-ASCII digits and spaces.
static RIGHTMOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\n\f\r]*~>[ \t\n\f\r]*([0-9]+)\.([0-9]+)[ \t\n\f\r]*$").expect("Invalid regex")
});

static MAJOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\n\f\r]*~>[ \t\n\f\r]*([0-9]+)\.").expect("Invalid regex"));

/// Returns true iff `raw` is exactly `~> x.y` (surrounding whitespace allowed).
#[must_use]
pub fn validate_format(raw: &str) -> bool {
    RIGHTMOST_PATTERN.is_match(raw)
}

/// Extract the major version from a `~> x.y` or `~> x.y.z` constraint.
///
/// Returns `None` when the string does not start with `~>` followed by a
/// number and a dot.
#[must_use]
pub fn extract_major(raw: &str) -> Option<u64> {
    MAJOR_PATTERN
        .captures(raw)
        .and_then(|caps| caps[1].parse().ok())
}

/// Message used when a constraint fails [`validate_format`].
///
/// `subject` names what carries the constraint, e.g. `Provider aws` or
/// `Module terraform-aws-modules/vpc/aws`.
#[must_use]
pub fn format_violation_message(subject: &str, raw: &str) -> String {
    format!(
        "{subject} version constraint should use '~> x.y' format where x is the major version \
         and y is the minor version (no patch version), got: {raw}"
    )
}
