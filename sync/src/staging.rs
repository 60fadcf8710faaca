//! Scoped staging areas for one fetch attempt.
//!
//! A [`StagingArea`] owns a freshly created, uniquely named directory that
//! holds the downloaded archive and the tree it unpacks into. Releasing the
//! area, explicitly or by dropping it, removes both, so nothing accumulates
//! across builds and a failed attempt cannot leak files into a retry.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tempfile::TempDir;

/// Prefix of every staging directory name.
const STAGING_PREFIX: &str = ".artefact-sync-";

/// Name of the extraction directory inside a staging area.
const UNPACKED_DIR: &str = "unpacked";

/// Transient directory holding one attempt's archive and extracted files.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    root: Utf8PathBuf,
    archive_path: Utf8PathBuf,
}

impl StagingArea {
    /// Create a new staging area.
    ///
    /// The directory is created under `parent` when given (the parent is
    /// created if needed) and under the system temporary directory otherwise.
    /// `archive_file_name` names the file the download is written to; its
    /// extension selects the extractor.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its path is not
    /// valid UTF-8.
    pub fn acquire(parent: Option<&Utf8Path>, archive_file_name: &str) -> io::Result<Self> {
        if matches!(archive_file_name, "" | "." | "..") || archive_file_name.contains('/') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unusable archive file name '{archive_file_name}'"),
            ));
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let archive_path = root.join(archive_file_name);
        Ok(Self {
            dir,
            root,
            archive_path,
        })
    }

    /// Where the downloaded archive is written.
    #[must_use]
    pub fn archive_path(&self) -> &Utf8Path {
        &self.archive_path
    }

    /// Where the archive is unpacked.
    #[must_use]
    pub fn extract_dir(&self) -> Utf8PathBuf {
        self.root.join(UNPACKED_DIR)
    }

    /// The staging area's own directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Remove the staging area and everything in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory could not be removed completely.
    pub fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}
