//! Bundle descriptors and the file naming convention they follow.
//!
//! A bundle is the set of files `wasm-bindgen` emits for one crate: the
//! compiled module, its type declarations and the JavaScript loader glue.
//! Some packages also ship licence and readme text next to the module.

use crate::artefact_name::ArtefactName;

/// Licence file shipped with bundles that include documentation.
const LICENCE_FILE: &str = "LICENSE";

/// Readme file shipped with bundles that include documentation.
const README_FILE: &str = "README.md";

/// The naming convention a bundle's files follow inside the archive.
///
/// # Examples
///
/// ```
/// use wasm_artefact_sync::artefact_name::ArtefactName;
/// use wasm_artefact_sync::bundle::ManifestConvention;
///
/// let convention = ManifestConvention::new("wasm32-unknown-unknown", "cloudproof_");
/// let files = convention.file_names(&ArtefactName::from("fpe"));
/// assert!(files.contains(&"cloudproof_fpe_bg.wasm".to_owned()));
/// assert_eq!(files.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestConvention {
    /// Directory inside the archive holding one sub-directory per bundle.
    pub source_root: String,
    /// Prefix prepended to every module file name.
    pub module_prefix: String,
    /// Whether `LICENSE` and `README.md` belong to the bundle.
    pub include_docs: bool,
}

impl ManifestConvention {
    /// Create a convention without licence and readme files.
    #[must_use]
    pub fn new(source_root: impl Into<String>, module_prefix: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            module_prefix: module_prefix.into(),
            include_docs: false,
        }
    }

    /// Return a copy of this convention that also expects licence and readme
    /// files.
    #[must_use]
    pub fn with_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = include_docs;
        self
    }

    /// The file names a bundle produces, in a fixed order.
    #[must_use]
    pub fn file_names(&self, name: &ArtefactName) -> Vec<String> {
        let stem = format!("{}{name}", self.module_prefix);
        let mut files = vec![
            format!("{stem}.d.ts"),
            format!("{stem}_bg.wasm"),
            format!("{stem}.js"),
            format!("{stem}_bg.wasm.d.ts"),
        ];
        if self.include_docs {
            files.push(LICENCE_FILE.to_owned());
            files.push(README_FILE.to_owned());
        }
        files
    }
}

/// One bundle together with the convention its archive layout follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    /// The bundle name.
    pub name: ArtefactName,
    /// How the bundle's files are named and where they live in the archive.
    pub convention: ManifestConvention,
}

impl BundleDescriptor {
    /// Pair a bundle name with its convention.
    #[must_use]
    pub fn new(name: impl Into<ArtefactName>, convention: ManifestConvention) -> Self {
        Self {
            name: name.into(),
            convention,
        }
    }
}
