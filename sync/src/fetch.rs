//! Archive download over HTTP.
//!
//! Provides a trait-based abstraction for fetching a published archive into
//! a local file, enabling dependency injection for testing. The production
//! [`HttpFetcher`] uses `ureq` with an explicit [`TransportConfig`]; nothing
//! about TLS or timeouts is configured process-wide.

use camino::Utf8PathBuf;
use serde::Deserialize;
use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use ureq::tls::{Certificate, RootCerts, TlsConfig};

/// Default network timeout for a whole archive transfer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait for retrieving an archive into a local file.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveFetcher {
    /// Fetch `url` and write the complete response body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not 200, or the
    /// body cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from archive downloads.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered 404.
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered with a status other than 200.
    #[error("unexpected HTTP status {status} for {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// The request could not be completed (DNS, connection, TLS, timeout).
    #[error("download failed for {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The pinned certificate authority could not be loaded.
    #[error("cannot load certificate authority {path}: {reason}")]
    CertificateAuthority {
        /// Path of the PEM file.
        path: Utf8PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// How the server certificate is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum TlsPolicy {
    /// Verify against the platform trust store.
    #[default]
    Verify,
    /// Trust only the certificate authority in the given PEM file.
    Pinned {
        /// PEM file holding the certificate authority.
        ca_file: Utf8PathBuf,
    },
    /// Skip certificate verification entirely.
    Insecure,
}

/// Transport settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for one complete request, body included.
    pub timeout: Duration,
    /// Certificate verification policy.
    pub tls: TlsPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            tls: TlsPolicy::Verify,
        }
    }
}

/// HTTP-based fetcher using `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Build a fetcher for the given transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::CertificateAuthority`] when a pinned certificate
    /// authority cannot be read or parsed.
    pub fn new(transport: &TransportConfig) -> Result<Self, FetchError> {
        let tls = tls_config(&transport.tls)?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(transport.timeout))
            .http_status_as_error(false)
            .tls_config(tls)
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
        })
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self.agent.get(url).call().map_err(|e| FetchError::Transport {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        check_status(url, response.status().as_u16())?;

        let mut file = std::fs::File::create(dest)?;
        let mut body = response.into_body();
        std::io::copy(&mut body.as_reader(), &mut file).map_err(|e| FetchError::Transport {
            url: url.to_owned(),
            reason: format!("reading response body: {e}"),
        })?;
        file.sync_all()?;
        Ok(())
    }
}

/// [`HttpFetcher`] that is only built on the first fetch.
///
/// Runs where every bundle set is already in place never load the pinned
/// certificate authority. A setup failure is returned from each fetch, so it
/// fails the attempt that needed the network.
pub struct LazyHttpFetcher {
    transport: TransportConfig,
    inner: OnceCell<HttpFetcher>,
}

impl LazyHttpFetcher {
    /// Defer building a fetcher for the given transport settings.
    #[must_use]
    pub const fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            inner: OnceCell::new(),
        }
    }

    fn fetcher(&self) -> Result<&HttpFetcher, FetchError> {
        if let Some(fetcher) = self.inner.get() {
            return Ok(fetcher);
        }
        let fetcher = HttpFetcher::new(&self.transport)?;
        Ok(self.inner.get_or_init(|| fetcher))
    }
}

impl ArchiveFetcher for LazyHttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.fetcher()?.fetch(url, dest)
    }
}

/// Translate a [`TlsPolicy`] into a `ureq` TLS configuration.
fn tls_config(policy: &TlsPolicy) -> Result<TlsConfig, FetchError> {
    let builder = TlsConfig::builder();
    let config = match policy {
        TlsPolicy::Verify => builder.build(),
        TlsPolicy::Insecure => builder.disable_verification(true).build(),
        TlsPolicy::Pinned { ca_file } => {
            let pem = std::fs::read(ca_file).map_err(|e| FetchError::CertificateAuthority {
                path: ca_file.clone(),
                reason: e.to_string(),
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                FetchError::CertificateAuthority {
                    path: ca_file.clone(),
                    reason: e.to_string(),
                }
            })?;
            builder
                .root_certs(RootCerts::Specific(Arc::new(vec![cert])))
                .build()
        }
    };
    Ok(config)
}

/// Map a response status to success or a [`FetchError`].
fn check_status(url: &str, status: u16) -> Result<(), FetchError> {
    match status {
        200 => Ok(()),
        404 => Err(FetchError::NotFound {
            url: url.to_owned(),
        }),
        other => Err(FetchError::Status {
            url: url.to_owned(),
            status: other,
        }),
    }
}
