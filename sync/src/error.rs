//! Error types for configuration and command-line failures.
//!
//! Failures inside a sync attempt never surface here: the orchestrator turns
//! them into a [`crate::orchestrator::SyncOutcome`]. This type covers what
//! stops the tool before any bundle set runs, plus the final "some sets
//! failed" verdict the binary maps to its exit status.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::checksum::InvalidDigest;
use crate::url_template::UrlTemplateError;

/// Errors that stop a synchronisation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configuration file could not be read.
    #[error("cannot read configuration {path}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("invalid configuration {path}: {reason}")]
    ConfigParse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// A bundle set's URL template is unusable.
    #[error("bundle set {set}: {source}")]
    UrlTemplate {
        /// Name of the bundle set.
        set: String,
        /// The template error.
        #[source]
        source: UrlTemplateError,
    },

    /// A pinned digest is malformed.
    #[error("bundle set {set}, pin for {version}: {source}")]
    Digest {
        /// Name of the bundle set.
        set: String,
        /// The version key of the pin.
        version: String,
        /// The validation error.
        #[source]
        source: InvalidDigest,
    },

    /// `--set` named a bundle set the configuration does not define.
    #[error("unknown bundle set {name}; available: {available}")]
    UnknownSet {
        /// The requested name.
        name: String,
        /// Comma-separated names of the configured sets.
        available: String,
    },

    /// One or more bundle sets could not be synchronised.
    #[error("{count} bundle set(s) failed to synchronise: {names}")]
    SetsFailed {
        /// Number of failed sets.
        count: usize,
        /// Comma-separated names of the failed sets.
        names: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_set_lists_available_names() {
        let err = SyncError::UnknownSet {
            name: "typo".to_owned(),
            available: "cloudproof-wasm, extras".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "unknown bundle set typo; available: cloudproof-wasm, extras"
        );
    }

    #[test]
    fn template_errors_name_the_set() {
        let err = SyncError::UrlTemplate {
            set: "extras".to_owned(),
            source: UrlTemplateError::MissingVersion {
                template: "https://example.test/wasm.zip".to_owned(),
            },
        };
        assert!(err.to_string().starts_with("bundle set extras: "));
    }
}
