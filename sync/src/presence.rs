//! Presence check for manifest destinations.
//!
//! Presence is the whole cache key: a destination that exists is trusted to
//! be current. Contents and timestamps are never inspected.

use crate::manifest::Manifest;
use camino::Utf8PathBuf;

/// Whether every destination of a manifest is already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// Every destination exists.
    Complete,
    /// At least one destination is missing.
    Incomplete {
        /// The destinations that do not exist, in manifest order.
        missing: Vec<Utf8PathBuf>,
    },
}

impl Presence {
    /// Return true when nothing needs fetching.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Stat every destination of `manifest`.
///
/// An empty manifest is trivially complete.
#[must_use]
pub fn check_presence(manifest: &Manifest) -> Presence {
    let missing: Vec<Utf8PathBuf> = manifest
        .iter()
        .filter(|entry| !entry.destination.exists())
        .map(|entry| entry.destination.clone())
        .collect();

    if missing.is_empty() {
        Presence::Complete
    } else {
        Presence::Incomplete { missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleDescriptor, ManifestConvention};
    use camino::Utf8Path;
    use std::fs;

    fn manifest_under(root: &Utf8Path) -> Manifest {
        let bundle = BundleDescriptor::new("fpe", ManifestConvention::new("wasm", "cloudproof_"));
        Manifest::for_bundle(&bundle, root)
    }

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, root)
    }

    #[test]
    fn all_destinations_present_is_complete() {
        let (_temp, root) = temp_root();
        let manifest = manifest_under(&root);
        for entry in &manifest {
            let parent = entry.destination.parent().expect("parent");
            fs::create_dir_all(parent).expect("create parent");
            fs::write(&entry.destination, b"").expect("write");
        }

        assert_eq!(check_presence(&manifest), Presence::Complete);
    }

    #[test]
    fn one_missing_destination_is_incomplete() {
        let (_temp, root) = temp_root();
        let manifest = manifest_under(&root);
        let mut entries = manifest.iter();
        let skipped = entries.next().expect("entry").destination.clone();
        for entry in entries {
            let parent = entry.destination.parent().expect("parent");
            fs::create_dir_all(parent).expect("create parent");
            fs::write(&entry.destination, b"stale").expect("write");
        }

        let presence = check_presence(&manifest);
        assert_eq!(
            presence,
            Presence::Incomplete {
                missing: vec![skipped]
            }
        );
        assert!(!presence.is_complete());
    }

    #[test]
    fn nothing_present_lists_every_destination() {
        let (_temp, root) = temp_root();
        let manifest = manifest_under(&root);
        match check_presence(&manifest) {
            Presence::Incomplete { missing } => assert_eq!(missing.len(), manifest.len()),
            Presence::Complete => panic!("expected Incomplete"),
        }
    }

    #[test]
    fn empty_manifest_is_complete() {
        assert!(check_presence(&Manifest::default()).is_complete());
    }
}
