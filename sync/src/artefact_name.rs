//! Semantic wrapper for bundle names.
//!
//! This module provides the [`ArtefactName`] newtype for type-safe handling of
//! the names that identify prebuilt bundles (for example `findex` or
//! `cover_crypt`).

use serde::Deserialize;
use std::fmt;

/// The name of one prebuilt bundle.
///
/// The name is opaque to the pipeline: it is interpolated into archive paths,
/// destination paths and, optionally, download URLs. No validation is
/// performed here; collisions between bundles of one set are the caller's
/// responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ArtefactName(String);

impl ArtefactName {
    /// Create a new artefact name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the artefact name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArtefactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArtefactName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ArtefactName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ArtefactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A release tag or build reference identifying one published archive.
///
/// Versions are never parsed; they are only interpolated into download URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Create a new version reference.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
