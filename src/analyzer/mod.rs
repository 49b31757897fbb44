//! Constraint analysis shared by the rules.
//!
//! # Components
//!
//! 1. **Constraint shape**: checks that a constraint is written as `~> x.y`
//!    and extracts its major version.
//!
//! 2. **Compatibility table**: which module majors go with which provider
//!    majors, per module source.
//!
//! 3. **Provider locator**: finds the version constraint declared for a
//!    provider in `terraform.required_providers`.
//!
//! # Example
//!
//! ```rust
//! use tidemark::analyzer::{extract_major, validate_format, CompatibilityTable};
//!
//! assert!(validate_format("~> 5.0"));
//! assert!(!validate_format("~> 5.0.1"));
//! assert_eq!(extract_major("~> 5.0.1"), Some(5));
//!
//! let table = CompatibilityTable::builtin();
//! assert_eq!(
//!     table.recommended_module_major("terraform-aws-modules/s3-bucket/aws", 5),
//!     Some(4)
//! );
//! ```

mod compat;
mod constraint;
mod locator;

pub use compat::{CompatibilityEntry, CompatibilityTable};
pub use constraint::{extract_major, format_violation_message, validate_format};
pub use locator::{find_provider_version, required_provider_versions, AWS_PROVIDER};
