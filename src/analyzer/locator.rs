//! Locates the declared version constraint of a provider.

use crate::parser::{Attribute, Document};

/// Name of the provider whose major version gates module compatibility.
pub const AWS_PROVIDER: &str = "aws";

/// Every `required_providers` entry of a document that declares a string
/// `version`, in block then attribute order.
///
/// Entries whose value is not an object (legacy `aws = "~> 5.0"`) or does not
/// evaluate are skipped.
pub fn required_provider_versions(document: &Document) -> impl Iterator<Item = (&Attribute, &str)> {
    document
        .blocks_of_type("terraform")
        .flat_map(|terraform| terraform.blocks_of_type("required_providers"))
        .flat_map(|required| required.attributes.iter())
        .filter_map(|attr| attr.expr.object_str("version").map(|version| (attr, version)))
}

/// Find the version constraint declared for provider `name`.
///
/// Documents are searched in order, then blocks, then attributes; the first
/// declaration wins. Later declarations that disagree with it are logged,
/// not reported.
#[must_use]
pub fn find_provider_version<'a>(documents: &'a [Document], name: &str) -> Option<&'a str> {
    let mut declarations = documents.iter().flat_map(move |document| {
        required_provider_versions(document)
            .filter(move |(attr, _)| attr.name == name)
            .map(move |(_, version)| (document, version))
    });

    let (first_document, version) = declarations.next()?;
    tracing::debug!(
        provider = %name,
        version = %version,
        file = %first_document.path().display(),
        "Found provider version"
    );

    for (document, other) in declarations {
        if other != version {
            tracing::warn!(
                provider = %name,
                used = %version,
                used_file = %first_document.path().display(),
                ignored = %other,
                ignored_file = %document.path().display(),
                "Conflicting provider version declarations, using the first one"
            );
        }
    }

    Some(version)
}
