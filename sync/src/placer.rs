//! Placement of staged files at their destinations.
//!
//! This module copies each manifest entry out of the staging tree into the
//! working tree, creating parent directories and overwriting stale files.

use crate::manifest::Manifest;
use camino::{Utf8Path, Utf8PathBuf};
use log::trace;
use std::fs;
use thiserror::Error;

/// Errors arising while placing staged files.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The unpacked archive does not contain a file the manifest expects.
    #[error("archive is missing {source_path}")]
    MissingSource {
        /// Archive-relative path that was expected.
        source_path: Utf8PathBuf,
    },

    /// A destination directory could not be created.
    #[error("cannot create directory {path}")]
    CreateDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be copied.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// Path inside the staging tree.
        from: Utf8PathBuf,
        /// Destination path.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Copy every entry of `manifest` from `staging_root` to its destination.
///
/// Entries are copied in manifest order. The first failure aborts the
/// remaining copies, so files placed before it stay in place; the next run
/// starts over because the presence check sees the missing files.
///
/// Returns the number of files placed.
///
/// # Errors
///
/// Returns [`PlacementError::MissingSource`] when the staging tree lacks an
/// expected file, [`PlacementError::CreateDir`] or [`PlacementError::Copy`]
/// when the filesystem write fails.
pub fn place(manifest: &Manifest, staging_root: &Utf8Path) -> Result<usize, PlacementError> {
    let mut placed = 0;
    for entry in manifest {
        let from = staging_root.join(&entry.source);
        if !from.is_file() {
            return Err(PlacementError::MissingSource {
                source_path: entry.source.clone(),
            });
        }

        if let Some(parent) = entry.destination.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| PlacementError::CreateDir {
                    path: parent.to_owned(),
                    source,
                })?;
            }
        }

        fs::copy(&from, &entry.destination).map_err(|source| PlacementError::Copy {
            from: from.clone(),
            to: entry.destination.clone(),
            source,
        })?;
        trace!("placed {} at {}", entry.source, entry.destination);
        placed += 1;
    }
    Ok(placed)
}
