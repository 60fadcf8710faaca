//! CLI argument definitions for `wasm-artefact-sync`.
//!
//! This module defines the command-line interface using clap. It is kept
//! separate from the entrypoint so the flag semantics can be tested without
//! running a synchronisation.

use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

use crate::config::SyncConfig;
use crate::context::ExecutionContext;
use crate::fetch::TlsPolicy;

/// Fetch prebuilt WebAssembly bundles into the source tree.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wasm-artefact-sync")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch prebuilt WebAssembly bundles into the source tree.\n\n",
    "Each bundle set names an archive URL, a primary version and the bundles ",
    "the archive provides. When every expected file already exists the set is ",
    "skipped without touching the network. Otherwise the archive for the ",
    "primary version is downloaded, unpacked into a temporary staging area and ",
    "the expected files are copied into place.\n\n",
    "Under automation (the CI environment variable is set, or --automated is ",
    "given) a failed primary download is retried once with the fallback version.\n\n",
    "A failed bundle set is reported but does not change the exit status ",
    "unless --strict is given.",
))]
#[command(after_help = concat!(
    "CONFIGURATION:\n",
    "  --config PATH, else artefact-sync.toml in the working directory,\n",
    "  else the built-in CloudProof bundle set.\n\n",
    "EXAMPLES:\n",
    "  Synchronise every configured bundle set:\n",
    "    $ wasm-artefact-sync\n\n",
    "  Show what would be fetched:\n",
    "    $ wasm-artefact-sync --dry-run\n\n",
    "  Synchronise one set, allowing the fallback version:\n",
    "    $ wasm-artefact-sync -s cloudproof-wasm --automated\n",
))]
pub struct Cli {
    /// Configuration file [default: artefact-sync.toml if present].
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Synchronise only the named bundle set (can be repeated).
    #[arg(short, long = "set", value_name = "NAME")]
    pub sets: Vec<String>,

    /// Parent directory for staging areas [default: system temp directory].
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Treat the run as automated, enabling the fallback version.
    #[arg(long)]
    pub automated: bool,

    /// Disable TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,

    /// Download timeout in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Show the plan and which files are missing, without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 1 when any bundle set fails.
    #[arg(long)]
    pub strict: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log filter implied by `-v`/`-q`.
    ///
    /// ```
    /// use log::LevelFilter;
    /// use wasm_artefact_sync::cli::Cli;
    ///
    /// let cli = Cli { verbosity: 2, ..Cli::default() };
    /// assert_eq!(cli.log_filter(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Apply command-line overrides to a loaded configuration.
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(dir) = &self.staging_dir {
            config.staging_dir = Some(dir.clone());
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if self.insecure {
            config.tls = TlsPolicy::Insecure;
        }
    }

    /// The execution context: automated when forced, else detected from
    /// `ci_env_var`.
    #[must_use]
    pub fn execution_context(&self, ci_env_var: &str) -> ExecutionContext {
        if self.automated {
            ExecutionContext::Automated
        } else {
            ExecutionContext::detect(ci_env_var)
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
