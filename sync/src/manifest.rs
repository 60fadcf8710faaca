//! Manifest of files a bundle set must provide.
//!
//! A [`Manifest`] maps paths inside an unpacked archive to the paths where
//! those files must end up in the working tree. Manifests are built from
//! [`BundleDescriptor`]s and never change after construction; several bundles
//! are combined with [`Manifest::merge`].

use crate::bundle::BundleDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::collections::HashSet;

/// One file to copy out of the staging tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the root of the unpacked archive.
    pub source: Utf8PathBuf,
    /// Path in the local working tree.
    pub destination: Utf8PathBuf,
}

/// An ordered mapping from archive-relative paths to destination paths.
///
/// Source paths are unique. Insertion order is preserved so that copies and
/// log output follow the order in which bundles were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build the manifest for a single bundle.
    ///
    /// Sources live under `<source_root>/<name>/` in the archive and land in
    /// `<destination_root>/<name>/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use wasm_artefact_sync::bundle::{BundleDescriptor, ManifestConvention};
    /// use wasm_artefact_sync::manifest::Manifest;
    ///
    /// let bundle = BundleDescriptor::new(
    ///     "fpe",
    ///     ManifestConvention::new("wasm32-unknown-unknown", "cloudproof_"),
    /// );
    /// let manifest = Manifest::for_bundle(&bundle, Utf8Path::new("src/pkg"));
    /// let first = manifest.iter().next().expect("manifest has entries");
    /// assert_eq!(first.source, "wasm32-unknown-unknown/fpe/cloudproof_fpe.d.ts");
    /// assert_eq!(first.destination, "src/pkg/fpe/cloudproof_fpe.d.ts");
    /// ```
    #[must_use]
    pub fn for_bundle(bundle: &BundleDescriptor, destination_root: &Utf8Path) -> Self {
        let name = bundle.name.as_str();
        let source_dir = Utf8Path::new(&bundle.convention.source_root).join(name);
        let destination_dir = destination_root.join(name);
        let entries = bundle
            .convention
            .file_names(&bundle.name)
            .into_iter()
            .map(|file| ManifestEntry {
                source: source_dir.join(&file),
                destination: destination_dir.join(&file),
            })
            .collect();
        Self { entries }
    }

    /// Build the merged manifest for several bundles.
    #[must_use]
    pub fn for_bundles<'a>(
        bundles: impl IntoIterator<Item = &'a BundleDescriptor>,
        destination_root: &Utf8Path,
    ) -> Self {
        bundles
            .into_iter()
            .map(|bundle| Self::for_bundle(bundle, destination_root))
            .fold(Self::default(), Self::merge)
    }

    /// Union of two manifests.
    ///
    /// Entries of `self` come first. When both manifests name the same source
    /// path the entry already present wins; distinct bundle names never
    /// collide, so this only happens when a caller lists a bundle twice.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        let mut seen: HashSet<Utf8PathBuf> =
            self.entries.iter().map(|e| e.source.clone()).collect();
        for entry in other.entries {
            if seen.insert(entry.source.clone()) {
                self.entries.push(entry);
            } else {
                debug!("manifest already contains {}; ignoring duplicate", entry.source);
            }
        }
        self
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// Number of files in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
