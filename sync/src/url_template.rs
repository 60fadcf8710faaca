//! Download URL templates.
//!
//! Templates carry a `{version}` placeholder and, for bundle sets published
//! as one archive per bundle, a `{name}` placeholder.

use crate::artefact_name::{ArtefactName, Version};
use std::fmt;
use thiserror::Error;

const VERSION_PLACEHOLDER: &str = "{version}";
const NAME_PLACEHOLDER: &str = "{name}";

/// Errors arising from an unusable URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlTemplateError {
    /// The template does not reference the version.
    #[error("URL template \"{template}\" has no {{version}} placeholder")]
    MissingVersion {
        /// The rejected template.
        template: String,
    },

    /// The template has no final path segment to name the archive with.
    #[error("URL template \"{template}\" does not end in an archive file name")]
    MissingArchiveName {
        /// The rejected template.
        template: String,
    },
}

/// A validated URL template.
///
/// # Examples
///
/// ```
/// use wasm_artefact_sync::artefact_name::Version;
/// use wasm_artefact_sync::url_template::UrlTemplate;
///
/// let template = UrlTemplate::parse(
///     "https://package.cosmian.com/cloudproof_rust/{version}/wasm.zip",
/// )
/// .expect("valid template");
/// assert_eq!(
///     template.render(&Version::from("v2.4.0"), None),
///     "https://package.cosmian.com/cloudproof_rust/v2.4.0/wasm.zip",
/// );
/// assert!(!template.is_per_bundle());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Validate a template string.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTemplateError::MissingVersion`] when `{version}` is absent
    /// and [`UrlTemplateError::MissingArchiveName`] when the template ends in
    /// a slash.
    pub fn parse(template: &str) -> Result<Self, UrlTemplateError> {
        if !template.contains(VERSION_PLACEHOLDER) {
            return Err(UrlTemplateError::MissingVersion {
                template: template.to_owned(),
            });
        }
        if template.ends_with('/') {
            return Err(UrlTemplateError::MissingArchiveName {
                template: template.to_owned(),
            });
        }
        Ok(Self(template.to_owned()))
    }

    /// Whether each bundle is published in an archive of its own.
    #[must_use]
    pub fn is_per_bundle(&self) -> bool {
        self.0.contains(NAME_PLACEHOLDER)
    }

    /// Interpolate the version and, when given, the bundle name.
    #[must_use]
    pub fn render(&self, version: &Version, name: Option<&ArtefactName>) -> String {
        let url = self.0.replace(VERSION_PLACEHOLDER, version.as_str());
        match name {
            Some(name) => url.replace(NAME_PLACEHOLDER, name.as_str()),
            None => url,
        }
    }

    /// The archive file name a rendered URL points at.
    ///
    /// Query strings and fragments are ignored so that the extension still
    /// identifies the archive format.
    #[must_use]
    pub fn archive_file_name(url: &str) -> &str {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.rsplit('/').next().unwrap_or(path)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn rejects_template_without_version() {
        let err = UrlTemplate::parse("https://example.test/latest/wasm.zip")
            .expect_err("template without version must fail");
        assert!(matches!(err, UrlTemplateError::MissingVersion { .. }));
        assert!(err.to_string().contains("{version}"));
    }

    #[test]
    fn rejects_template_without_file_name() {
        let err = UrlTemplate::parse("https://example.test/{version}/")
            .expect_err("template ending in slash must fail");
        assert!(matches!(err, UrlTemplateError::MissingArchiveName { .. }));
    }

    #[test]
    fn renders_branch_style_versions_verbatim() {
        let template = UrlTemplate::parse("https://example.test/pkg/{version}/wasm.zip")
            .expect("valid template");
        let url = template.render(&Version::from("last_build/fix/add_python_compact"), None);
        assert_eq!(
            url,
            "https://example.test/pkg/last_build/fix/add_python_compact/wasm.zip"
        );
    }

    #[test]
    fn per_bundle_templates_interpolate_the_name() {
        let template = UrlTemplate::parse("https://example.test/{version}/{name}.tar.zst")
            .expect("valid template");
        assert!(template.is_per_bundle());
        let url = template.render(&Version::from("v1"), Some(&ArtefactName::from("fpe")));
        assert_eq!(url, "https://example.test/v1/fpe.tar.zst");
    }

    #[rstest]
    #[case::plain("https://example.test/v1/wasm.zip", "wasm.zip")]
    #[case::query("https://example.test/v1/wasm.zip?token=abc", "wasm.zip")]
    #[case::fragment("https://example.test/v1/bundle.tar.gz#top", "bundle.tar.gz")]
    fn archive_file_name_is_last_segment(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(UrlTemplate::archive_file_name(url), expected);
    }
}
