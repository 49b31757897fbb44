//! Module/provider compatibility table.
//!
//! `terraform-aws-modules` only started tying breaking module releases to
//! breaking AWS provider releases recently, so the pairs are listed by hand.
//! The table is plain data; supporting a new module or provider major is an
//! extra entry, not new logic.

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// One sanctioned pairing of provider major and module major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    /// Major version of the provider
    pub provider: u64,
    /// Major version of the module to use with it
    pub module: u64,
}

impl CompatibilityEntry {
    /// Create a new entry.
    #[must_use]
    pub const fn new(provider: u64, module: u64) -> Self {
        Self { provider, module }
    }
}

const BUILTIN_ENTRIES: &[(&str, &[CompatibilityEntry])] = &[
    (
        "terraform-aws-modules/s3-bucket/aws",
        &[CompatibilityEntry::new(5, 4), CompatibilityEntry::new(6, 5)],
    ),
    (
        "terraform-aws-modules/vpc/aws",
        &[CompatibilityEntry::new(5, 5), CompatibilityEntry::new(6, 6)],
    ),
    (
        "terraform-aws-modules/lambda/aws",
        &[CompatibilityEntry::new(5, 7), CompatibilityEntry::new(6, 8)],
    ),
];

static BUILTIN: LazyLock<CompatibilityTable> = LazyLock::new(|| {
    CompatibilityTable::from_entries(
        BUILTIN_ENTRIES
            .iter()
            .map(|(source, entries)| ((*source).to_string(), entries.to_vec())),
    )
});

/// Mapping from module source to its ordered compatibility entries.
///
/// Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityTable {
    entries: BTreeMap<String, Vec<CompatibilityEntry>>,
}

impl CompatibilityTable {
    /// Build a table from `(source, entries)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<CompatibilityEntry>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The built-in table shared by the whole process.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// The built-in table with the configuration's `compatibility` section
    /// layered on top. A configured source replaces the built-in entries for
    /// that source.
    #[must_use]
    pub fn with_overrides(config: &Config) -> Self {
        let mut entries = Self::builtin().entries.clone();
        for (source, configured) in &config.compatibility {
            tracing::debug!(
                source = %source,
                entries = configured.len(),
                replaces_builtin = entries.contains_key(source),
                "Applying configured compatibility entries"
            );
            entries.insert(source.clone(), configured.clone());
        }
        Self { entries }
    }

    /// Entries for a module source, or `None` for modules the table does not govern.
    #[must_use]
    pub fn entries(&self, source: &str) -> Option<&[CompatibilityEntry]> {
        self.entries.get(source).map(Vec::as_slice)
    }

    /// Whether the table governs the given module source.
    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    /// True iff an entry for `source` pairs exactly these two majors.
    #[must_use]
    pub fn is_compatible(&self, source: &str, provider_major: u64, module_major: u64) -> bool {
        self.entries(source).is_some_and(|entries| {
            entries
                .iter()
                .any(|e| e.provider == provider_major && e.module == module_major)
        })
    }

    /// Module major of the first entry for `source` whose provider major matches.
    ///
    /// `None` means the table has no mapping at all for this provider major.
    #[must_use]
    pub fn recommended_module_major(&self, source: &str, provider_major: u64) -> Option<u64> {
        self.entries(source)?
            .iter()
            .find(|e| e.provider == provider_major)
            .map(|e| e.module)
    }

    /// All governed module sources, in sorted order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S3: &str = "terraform-aws-modules/s3-bucket/aws";

    #[test]
    fn test_builtin_s3_bucket() {
        let table = CompatibilityTable::builtin();
        assert!(table.is_compatible(S3, 5, 4));
        assert!(!table.is_compatible(S3, 5, 5));
        assert!(table.is_compatible(S3, 6, 5));
        assert_eq!(table.recommended_module_major(S3, 5), Some(4));
        assert_eq!(table.recommended_module_major(S3, 6), Some(5));
    }

    #[test]
    fn test_builtin_vpc_and_lambda() {
        let table = CompatibilityTable::builtin();
        assert!(table.is_compatible("terraform-aws-modules/vpc/aws", 5, 5));
        assert!(table.is_compatible("terraform-aws-modules/vpc/aws", 6, 6));
        assert!(table.is_compatible("terraform-aws-modules/lambda/aws", 5, 7));
        assert!(table.is_compatible("terraform-aws-modules/lambda/aws", 6, 8));
        assert!(!table.is_compatible("terraform-aws-modules/lambda/aws", 6, 7));
    }

    #[test]
    fn test_unknown_provider_major_has_no_recommendation() {
        let table = CompatibilityTable::builtin();
        assert!(!table.is_compatible(S3, 4, 3));
        assert_eq!(table.recommended_module_major(S3, 4), None);
    }

    #[test]
    fn test_unknown_source() {
        let table = CompatibilityTable::builtin();
        assert!(!table.contains("terraform-aws-modules/eks/aws"));
        assert_eq!(table.entries("terraform-aws-modules/eks/aws"), None);
        assert!(!table.is_compatible("terraform-aws-modules/eks/aws", 5, 20));
        assert_eq!(table.recommended_module_major("terraform-aws-modules/eks/aws", 5), None);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let table = CompatibilityTable::from_entries([(
            "example/mod/aws".to_string(),
            vec![
                CompatibilityEntry::new(5, 2),
                CompatibilityEntry::new(5, 3),
                CompatibilityEntry::new(6, 4),
            ],
        )]);
        assert!(table.is_compatible("example/mod/aws", 5, 3));
        assert_eq!(table.recommended_module_major("example/mod/aws", 5), Some(2));
    }

    #[test]
    fn test_with_overrides() {
        let mut config = Config::default();
        config.compatibility.insert(
            "terraform-aws-modules/eks/aws".to_string(),
            vec![CompatibilityEntry::new(5, 20)],
        );
        config
            .compatibility
            .insert(S3.to_string(), vec![CompatibilityEntry::new(5, 9)]);

        let table = CompatibilityTable::with_overrides(&config);
        assert!(table.is_compatible("terraform-aws-modules/eks/aws", 5, 20));
        assert!(table.is_compatible(S3, 5, 9));
        assert!(!table.is_compatible(S3, 5, 4));
        assert!(table.contains("terraform-aws-modules/vpc/aws"));

        // the shared built-in table is untouched
        assert!(CompatibilityTable::builtin().is_compatible(S3, 5, 4));
    }

    #[test]
    fn test_sources_sorted() {
        let sources: Vec<_> = CompatibilityTable::builtin().sources().collect();
        assert_eq!(
            sources,
            vec![
                "terraform-aws-modules/lambda/aws",
                "terraform-aws-modules/s3-bucket/aws",
                "terraform-aws-modules/vpc/aws",
            ]
        );
    }
}
