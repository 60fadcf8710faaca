//! Idempotent fetch-extract-place pipeline with CI-gated version fallback.
//!
//! [`SyncOrchestrator::sync`] runs one bundle set through
//! `CheckingCache → {Satisfied | Fetching → Extracting → Placing → {Done | Failed}}`.
//! When every destination already exists nothing touches the network. A
//! failed primary attempt is retried once with the fallback version, but only
//! under automation. Failures never escape as errors: the caller inspects the
//! returned [`SyncOutcome`].

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use thiserror::Error;

use crate::artefact_name::{ArtefactName, Version};
use crate::bundle::BundleDescriptor;
use crate::checksum::{Sha256Digest, compute_sha256};
use crate::context::ExecutionContext;
use crate::extract::{ArchiveExtractor, ExtractionError};
use crate::fetch::{ArchiveFetcher, FetchError};
use crate::manifest::Manifest;
use crate::output::write_stderr_line;
use crate::placer::{PlacementError, place};
use crate::presence::{Presence, check_presence};
use crate::staging::StagingArea;
use crate::url_template::UrlTemplate;

/// Everything needed to synchronise one bundle set.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Human-readable name used in logs and progress output.
    pub label: String,
    /// The bundles the set must provide.
    pub bundles: Vec<BundleDescriptor>,
    /// Directory receiving one sub-directory per bundle.
    pub destination_root: Utf8PathBuf,
    /// Where archives are downloaded from.
    pub url_template: UrlTemplate,
    /// The stable release to fetch.
    pub primary_version: Version,
    /// The build reference tried under automation when the primary fails.
    pub fallback_version: Option<Version>,
    /// Optional archive digests, keyed by [`SyncPlan::digest_key`].
    pub digests: HashMap<String, Sha256Digest>,
}

impl SyncPlan {
    /// The merged manifest of every bundle in the set.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::for_bundles(&self.bundles, &self.destination_root)
    }

    /// Key under which the archive digest for `version` is pinned.
    ///
    /// Shared archives are keyed by the version alone; per-bundle archives by
    /// `<version>/<name>`.
    #[must_use]
    pub fn digest_key(version: &Version, name: Option<&ArtefactName>) -> String {
        match name {
            Some(name) => format!("{version}/{name}"),
            None => version.to_string(),
        }
    }

    /// Split the set into the archives that must be downloaded.
    fn fetch_units(&self) -> Vec<FetchUnit<'_>> {
        if self.url_template.is_per_bundle() {
            self.bundles
                .iter()
                .map(|bundle| FetchUnit {
                    name: Some(&bundle.name),
                    manifest: Manifest::for_bundle(bundle, &self.destination_root),
                })
                .collect()
        } else {
            vec![FetchUnit {
                name: None,
                manifest: self.manifest(),
            }]
        }
    }
}

/// One archive download and the files it must provide.
struct FetchUnit<'a> {
    name: Option<&'a ArtefactName>,
    manifest: Manifest,
}

/// Pipeline states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Checking whether every destination exists.
    CheckingCache,
    /// Every destination exists; nothing to do.
    Satisfied,
    /// Downloading an archive.
    Fetching,
    /// Unpacking the archive into the staging area.
    Extracting,
    /// Copying files to their destinations.
    Placing,
    /// All files placed.
    Done,
    /// The attempt failed.
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckingCache => "checking cache",
            Self::Satisfied => "satisfied",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Placing => "placing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why one attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The archive could not be downloaded.
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),

    /// The downloaded archive does not match its pinned digest.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The pinned digest.
        expected: Sha256Digest,
        /// The digest of the downloaded file.
        actual: Sha256Digest,
    },

    /// The downloaded archive could not be hashed.
    #[error("checksum computation failed: {0}")]
    Checksum(#[source] std::io::Error),

    /// The archive could not be unpacked.
    #[error("archive error: {0}")]
    Archive(#[from] ExtractionError),

    /// Files could not be placed.
    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    /// The staging area could not be created.
    #[error("staging error: {0}")]
    Staging(#[source] std::io::Error),
}

/// A failed attempt, with the context needed to diagnose it.
#[derive(Debug)]
pub struct AttemptFailure {
    /// The version that was tried.
    pub version: Version,
    /// The URL that was being processed.
    pub url: String,
    /// What went wrong.
    pub error: AttemptError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.version, self.url, self.error)
    }
}

/// The result of synchronising one bundle set.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Every destination already existed; no download happened.
    Satisfied,
    /// Files were downloaded and placed.
    Synced {
        /// The version that provided the files.
        version: Version,
        /// Number of files placed.
        placed: usize,
        /// Number of attempts made (1 or 2).
        attempts: usize,
    },
    /// The set could not be synchronised. Files placed before the failure
    /// stay on disk.
    Failed {
        /// One entry per attempt, in order.
        failures: Vec<AttemptFailure>,
    },
}

impl SyncOutcome {
    /// Whether the destinations are now complete.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Number of archive download attempts made.
    #[must_use]
    pub fn attempts(&self) -> usize {
        match self {
            Self::Satisfied => 0,
            Self::Synced { attempts, .. } => *attempts,
            Self::Failed { failures } => failures.len(),
        }
    }
}

/// Runs bundle sets through the pipeline.
///
/// The fetcher and extractor are injected so that tests can replace the
/// network and the archive decoders.
pub struct SyncOrchestrator<'a> {
    fetcher: &'a dyn ArchiveFetcher,
    extractor: &'a dyn ArchiveExtractor,
    context: ExecutionContext,
    staging_parent: Option<Utf8PathBuf>,
    quiet: bool,
}

impl<'a> SyncOrchestrator<'a> {
    /// Create an orchestrator for the given execution context.
    #[must_use]
    pub fn new(
        fetcher: &'a dyn ArchiveFetcher,
        extractor: &'a dyn ArchiveExtractor,
        context: ExecutionContext,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            context,
            staging_parent: None,
            quiet: false,
        }
    }

    /// Create staging areas under `parent` instead of the system temporary
    /// directory.
    #[must_use]
    pub fn with_staging_parent(mut self, parent: Option<Utf8PathBuf>) -> Self {
        self.staging_parent = parent;
        self
    }

    /// Suppress progress output.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Synchronise one bundle set.
    ///
    /// Returns [`SyncOutcome::Satisfied`] without any download when every
    /// destination exists. Otherwise the primary version is tried; on failure
    /// under automation the fallback version is tried exactly once. Staging
    /// areas are removed before this returns, whatever the outcome.
    pub fn sync(&self, plan: &SyncPlan, stderr: &mut dyn Write) -> SyncOutcome {
        self.enter(plan, SyncState::CheckingCache);
        let manifest = plan.manifest();
        if let Presence::Incomplete { missing } = check_presence(&manifest) {
            debug!(
                "{}: {} of {} files missing, first: {}",
                plan.label,
                missing.len(),
                manifest.len(),
                missing
                    .first()
                    .map_or_else(String::new, ToString::to_string)
            );
        } else {
            self.enter(plan, SyncState::Satisfied);
            self.progress(stderr, format!("{}: files are present, skipping.", plan.label));
            return SyncOutcome::Satisfied;
        }

        let mut failures = Vec::new();
        match self.attempt(plan, &plan.primary_version, stderr) {
            Ok(placed) => return Self::synced(plan, &plan.primary_version, placed, 1),
            Err(failure) => failures.push(failure),
        }

        let Some(fallback) = plan.fallback_version.as_ref() else {
            return SyncOutcome::Failed { failures };
        };
        if !self.context.allows_fallback() {
            debug!(
                "{}: not retrying with {fallback} outside automation",
                plan.label
            );
            return SyncOutcome::Failed { failures };
        }

        self.progress(
            stderr,
            format!("{}: retrying with fallback {fallback}", plan.label),
        );
        match self.attempt(plan, fallback, stderr) {
            Ok(placed) => Self::synced(plan, fallback, placed, 2),
            Err(failure) => {
                failures.push(failure);
                SyncOutcome::Failed { failures }
            }
        }
    }

    fn synced(plan: &SyncPlan, version: &Version, placed: usize, attempts: usize) -> SyncOutcome {
        info!("{}: placed {placed} files from {version}", plan.label);
        SyncOutcome::Synced {
            version: version.clone(),
            placed,
            attempts,
        }
    }

    /// Fetch, extract and place every archive of the set for `version`.
    fn attempt(
        &self,
        plan: &SyncPlan,
        version: &Version,
        stderr: &mut dyn Write,
    ) -> Result<usize, AttemptFailure> {
        let mut placed = 0;
        for unit in plan.fetch_units() {
            let url = plan.url_template.render(version, unit.name);
            match self.attempt_unit(plan, version, &unit, &url, stderr) {
                Ok(count) => placed += count,
                Err(error) => {
                    self.enter(plan, SyncState::Failed);
                    warn!("{}: attempt with {version} failed for {url}: {error}", plan.label);
                    self.progress(
                        stderr,
                        format!("Cannot get {} {version} ({error})", plan.label),
                    );
                    return Err(AttemptFailure {
                        version: version.clone(),
                        url,
                        error,
                    });
                }
            }
        }
        self.enter(plan, SyncState::Done);
        Ok(placed)
    }

    /// Run one archive through the pipeline inside its own staging area.
    fn attempt_unit(
        &self,
        plan: &SyncPlan,
        version: &Version,
        unit: &FetchUnit<'_>,
        url: &str,
        stderr: &mut dyn Write,
    ) -> Result<usize, AttemptError> {
        let archive_name = UrlTemplate::archive_file_name(url);
        let area = StagingArea::acquire(self.staging_parent.as_deref(), archive_name)
            .map_err(AttemptError::Staging)?;

        let result = self.run_steps(plan, version, unit, url, &area, stderr);

        let root = area.root().to_owned();
        if let Err(e) = area.release() {
            warn!("{}: failed to remove staging area {root}: {e}", plan.label);
        }
        result
    }

    fn run_steps(
        &self,
        plan: &SyncPlan,
        version: &Version,
        unit: &FetchUnit<'_>,
        url: &str,
        area: &StagingArea,
        stderr: &mut dyn Write,
    ) -> Result<usize, AttemptError> {
        self.enter(plan, SyncState::Fetching);
        self.progress(stderr, format!("Downloading {url}..."));
        self.fetcher.fetch(url, area.archive_path().as_std_path())?;

        let key = SyncPlan::digest_key(version, unit.name);
        if let Some(expected) = plan.digests.get(&key) {
            verify_digest(area.archive_path(), expected)?;
        }

        self.enter(plan, SyncState::Extracting);
        let extract_dir = area.extract_dir();
        let files = self
            .extractor
            .extract(area.archive_path().as_std_path(), extract_dir.as_std_path())?;
        debug!("{}: unpacked {} files from {url}", plan.label, files.len());

        self.enter(plan, SyncState::Placing);
        self.progress(
            stderr,
            format!("Copying new files from {} {version}", plan.label),
        );
        Ok(place(&unit.manifest, &extract_dir)?)
    }

    fn enter(&self, plan: &SyncPlan, state: SyncState) {
        debug!("{}: {state} ({:?})", plan.label, self.context);
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

fn verify_digest(archive: &Utf8Path, expected: &Sha256Digest) -> Result<(), AttemptError> {
    let actual = compute_sha256(archive.as_std_path()).map_err(AttemptError::Checksum)?;
    if &actual != expected {
        return Err(AttemptError::ChecksumMismatch {
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
