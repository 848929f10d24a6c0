//! HTTP health probe.
//!
//! Issues a GET against the target URL using a shared [`reqwest`]
//! client. A 2xx/3xx response counts as `Up`; 4xx/5xx counts as `Down`
//! with the status code recorded; request timeouts count as `Timeout`.

use std::time::{Duration, Instant};

use network_monitor_core::report::{ProbeKind, ProbeResult};

use crate::tls::TlsSettings;

/// HTTP probe client. One instance is shared by all HTTP targets so
/// they can reuse the underlying connection pool.
pub struct HttpChecker {
    client: reqwest::Client,
}

/// Errors while constructing the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum HttpCheckerError {
    #[error("CA bundle is not usable by the HTTP client: {0}")]
    InvalidCaBundle(reqwest::Error),

    #[error("CA bundle contains no certificates usable by the HTTP client")]
    EmptyCaBundle,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

/// Parse every certificate in a PEM bundle.
///
/// `Certificate::from_pem` would only read the first entry of a
/// multi-certificate bundle, silently dropping the remaining roots, so
/// the bundle is split and every certificate is returned.
fn parse_ca_bundle(pem: &[u8]) -> Result<Vec<reqwest::Certificate>, HttpCheckerError> {
    let certs =
        reqwest::Certificate::from_pem_bundle(pem).map_err(HttpCheckerError::InvalidCaBundle)?;
    if certs.is_empty() {
        return Err(HttpCheckerError::EmptyCaBundle);
    }
    Ok(certs)
}

impl HttpChecker {
    /// Build the shared client with the per-probe timeout and, when a
    /// CA bundle is configured, every certificate in it as an extra
    /// root.
    pub fn new(timeout: Duration, tls: &TlsSettings) -> Result<Self, HttpCheckerError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);

        if let Some(pem) = tls.ca_pem() {
            for cert in parse_ca_bundle(pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build().map_err(HttpCheckerError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Probe a URL once.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                let latency = start.elapsed().as_millis() as u64;

                if status.is_client_error() || status.is_server_error() {
                    tracing::debug!(url, status = status.as_u16(), "HTTP probe returned error status");
                    ProbeResult::down(
                        url,
                        ProbeKind::Http,
                        latency,
                        format!("HTTP {}", status.as_u16()),
                    )
                    .with_http_status(status.as_u16())
                } else {
                    tracing::debug!(url, status = status.as_u16(), latency_ms = latency, "HTTP probe OK");
                    ProbeResult::up(url, ProbeKind::Http, latency)
                        .with_http_status(status.as_u16())
                }
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!(url, "HTTP probe timed out");
                ProbeResult::timeout(url, ProbeKind::Http, start.elapsed().as_millis() as u64)
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "HTTP probe failed");
                ProbeResult::down(
                    url,
                    ProbeKind::Http,
                    start.elapsed().as_millis() as u64,
                    format!("request failed: {e}"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_without_certificates_is_an_error() {
        assert!(parse_ca_bundle(b"").is_err());
        assert!(parse_ca_bundle(b"not a certificate\n").is_err());
    }

    #[test]
    fn client_builds_without_a_bundle() {
        let tls = TlsSettings::from_ca_path(None).unwrap();
        assert!(HttpChecker::new(Duration::from_secs(1), &tls).is_ok());
    }
}
