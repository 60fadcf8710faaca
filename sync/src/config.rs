//! Configuration of bundle sets and transport settings.
//!
//! The configuration is read from TOML. When no file is given and none is
//! found in the working directory, a built-in default describing the
//! CloudProof WebAssembly bundles is used.
//!
//! ```toml
//! ci_env_var = "GITHUB_ACTIONS"
//! timeout_secs = 120
//!
//! [tls]
//! mode = "verify"
//!
//! [[bundle_set]]
//! name = "cloudproof-wasm"
//! url = "https://package.cosmian.com/cloudproof_rust/{version}/wasm.zip"
//! primary_version = "v2.4.0"
//! fallback_version = "last_build/fix/add_python_compact"
//! source_root = "wasm32-unknown-unknown"
//! destination_root = "src/pkg"
//! module_prefix = "cloudproof_"
//! bundles = ["aesgcm", "anonymization", "cover_crypt", "fpe", "findex", "ecies"]
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;

use crate::artefact_name::{ArtefactName, Version};
use crate::bundle::{BundleDescriptor, ManifestConvention};
use crate::checksum::Sha256Digest;
use crate::context::DEFAULT_CI_ENV_VAR;
use crate::error::{Result, SyncError};
use crate::fetch::{DEFAULT_TIMEOUT, TlsPolicy, TransportConfig};
use crate::orchestrator::SyncPlan;
use crate::url_template::UrlTemplate;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "artefact-sync.toml";

const CLOUDPROOF_URL: &str = "https://package.cosmian.com/cloudproof_rust/{version}/wasm.zip";
const CLOUDPROOF_PRIMARY: &str = "v2.4.0";
const CLOUDPROOF_FALLBACK: &str = "last_build/fix/add_python_compact";
const CLOUDPROOF_BUNDLES: [&str; 6] = [
    "aesgcm",
    "anonymization",
    "cover_crypt",
    "fpe",
    "findex",
    "ecies",
];
const WASM_SOURCE_ROOT: &str = "wasm32-unknown-unknown";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Environment variable marking automated execution.
    #[serde(default = "default_ci_env_var")]
    pub ci_env_var: String,
    /// Parent directory for staging areas; the system temporary directory
    /// when absent.
    #[serde(default)]
    pub staging_dir: Option<Utf8PathBuf>,
    /// Timeout for one archive download, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Certificate verification policy.
    #[serde(default)]
    pub tls: TlsPolicy,
    /// The bundle sets to synchronise, in order.
    #[serde(default, rename = "bundle_set")]
    pub bundle_sets: Vec<BundleSetConfig>,
}

/// One bundle set as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleSetConfig {
    /// Unique name of the set.
    pub name: String,
    /// Download URL template with a `{version}` and optional `{name}`
    /// placeholder.
    pub url: String,
    /// The stable release to fetch.
    pub primary_version: Version,
    /// The build reference tried under automation when the primary fails.
    #[serde(default)]
    pub fallback_version: Option<Version>,
    /// Directory inside the archive holding one sub-directory per bundle.
    #[serde(default = "default_source_root")]
    pub source_root: String,
    /// Directory receiving one sub-directory per bundle.
    pub destination_root: Utf8PathBuf,
    /// Prefix of every module file name.
    #[serde(default)]
    pub module_prefix: String,
    /// Whether `LICENSE` and `README.md` belong to each bundle.
    #[serde(default)]
    pub include_docs: bool,
    /// Bundle names.
    pub bundles: Vec<ArtefactName>,
    /// Archive digests keyed by version (or `<version>/<name>` for
    /// per-bundle URLs).
    #[serde(default)]
    pub sha256: BTreeMap<String, String>,
}

fn default_ci_env_var() -> String {
    DEFAULT_CI_ENV_VAR.to_owned()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_source_root() -> String {
    WASM_SOURCE_ROOT.to_owned()
}

impl Default for SyncConfig {
    /// The CloudProof WebAssembly bundles, verified TLS, 120 s timeout.
    fn default() -> Self {
        Self {
            ci_env_var: default_ci_env_var(),
            staging_dir: None,
            timeout_secs: default_timeout_secs(),
            tls: TlsPolicy::Verify,
            bundle_sets: vec![BundleSetConfig {
                name: "cloudproof-wasm".to_owned(),
                url: CLOUDPROOF_URL.to_owned(),
                primary_version: Version::from(CLOUDPROOF_PRIMARY),
                fallback_version: Some(Version::from(CLOUDPROOF_FALLBACK)),
                source_root: default_source_root(),
                destination_root: Utf8PathBuf::from("src/pkg"),
                module_prefix: "cloudproof_".to_owned(),
                include_docs: false,
                bundles: CLOUDPROOF_BUNDLES
                    .iter()
                    .map(|name| ArtefactName::from(*name))
                    .collect(),
                sha256: BTreeMap::new(),
            }],
        }
    }
}

impl SyncConfig {
    /// Parse and validate configuration text. `origin` names the source in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigParse`] for malformed TOML or unknown keys,
    /// and the errors of [`SyncConfig::validate`].
    pub fn parse(text: &str, origin: &Utf8Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SyncError::ConfigParse {
            path: origin.to_owned(),
            reason: e.message().to_owned(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigRead`] when the file cannot be read, and the
    /// errors of [`SyncConfig::parse`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SyncError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Resolve the configuration to use.
    ///
    /// An explicit path wins; otherwise [`DEFAULT_CONFIG_FILE`] in `cwd` is
    /// used when it exists; otherwise the built-in default.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`SyncConfig::load`].
    pub fn discover(explicit: Option<&Utf8Path>, cwd: &Utf8Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            debug!("using configuration {candidate}");
            return Self::load(&candidate);
        }
        debug!("no {DEFAULT_CONFIG_FILE} in {cwd}; using built-in configuration");
        Ok(Self::default())
    }

    /// Check the configuration for problems serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] when there are no bundle sets, the
    /// timeout is zero, a set has no bundles, names repeat, or a pinned TLS
    /// policy names an empty CA path; [`SyncError::UrlTemplate`] for unusable URL templates;
    /// [`SyncError::Digest`] for malformed pins.
    pub fn validate(&self) -> Result<()> {
        if self.bundle_sets.is_empty() {
            return Err(invalid("no bundle sets configured"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs must be greater than zero"));
        }
        if matches!(&self.tls, TlsPolicy::Pinned { ca_file } if ca_file.as_str().is_empty()) {
            return Err(invalid("tls mode \"pinned\" requires ca_file"));
        }
        let mut seen = HashSet::new();
        for set in &self.bundle_sets {
            if !seen.insert(set.name.as_str()) {
                return Err(invalid(format!("duplicate bundle set name {}", set.name)));
            }
            set.validate()?;
        }
        Ok(())
    }

    /// Transport settings for the HTTP fetcher.
    #[must_use]
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            tls: self.tls.clone(),
        }
    }

    /// Names of all configured sets, in order.
    #[must_use]
    pub fn set_names(&self) -> Vec<&str> {
        self.bundle_sets.iter().map(|set| set.name.as_str()).collect()
    }

    /// Build plans for the selected sets, or for every set when `selected`
    /// is empty. Plans follow configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownSet`] when a selected name is not
    /// configured, and the errors of [`BundleSetConfig::to_plan`].
    pub fn plans(&self, selected: &[String]) -> Result<Vec<SyncPlan>> {
        for name in selected {
            if !self.bundle_sets.iter().any(|set| &set.name == name) {
                return Err(SyncError::UnknownSet {
                    name: name.clone(),
                    available: self.set_names().join(", "),
                });
            }
        }
        self.bundle_sets
            .iter()
            .filter(|set| selected.is_empty() || selected.contains(&set.name))
            .map(BundleSetConfig::to_plan)
            .collect()
    }
}

impl BundleSetConfig {
    fn validate(&self) -> Result<()> {
        if self.bundles.is_empty() {
            return Err(invalid(format!("bundle set {} lists no bundles", self.name)));
        }
        self.url_template()?;
        self.digests()?;
        Ok(())
    }

    fn url_template(&self) -> Result<UrlTemplate> {
        UrlTemplate::parse(&self.url).map_err(|source| SyncError::UrlTemplate {
            set: self.name.clone(),
            source,
        })
    }

    fn digests(&self) -> Result<HashMap<String, Sha256Digest>> {
        self.sha256
            .iter()
            .map(|(version, hex)| {
                let digest =
                    Sha256Digest::try_from(hex.as_str()).map_err(|source| SyncError::Digest {
                        set: self.name.clone(),
                        version: version.clone(),
                        source,
                    })?;
                Ok((version.clone(), digest))
            })
            .collect()
    }

    /// The descriptors of this set's bundles.
    #[must_use]
    pub fn descriptors(&self) -> Vec<BundleDescriptor> {
        let convention = ManifestConvention::new(&self.source_root, &self.module_prefix)
            .with_docs(self.include_docs);
        self.bundles
            .iter()
            .map(|name| BundleDescriptor::new(name.clone(), convention.clone()))
            .collect()
    }

    /// Turn this set into an executable plan.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UrlTemplate`] or [`SyncError::Digest`] when the
    /// set has not been validated and is unusable.
    pub fn to_plan(&self) -> Result<SyncPlan> {
        Ok(SyncPlan {
            label: self.name.clone(),
            bundles: self.descriptors(),
            destination_root: self.destination_root.clone(),
            url_template: self.url_template()?,
            primary_version: self.primary_version.clone(),
            fallback_version: self.fallback_version.clone(),
            digests: self.digests()?,
        })
    }
}

fn invalid(reason: impl Into<String>) -> SyncError {
    SyncError::InvalidConfig {
        reason: reason.into(),
    }
}
