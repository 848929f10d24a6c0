//! TLS trust configuration for `wss://` and `https://` endpoints.
//!
//! By default both the WebSocket and HTTP layers verify peers against
//! the built-in webpki root set. When `CA_CERT_PATH` points at a PEM
//! bundle (e.g. a private CA or a pinned `cacert.pem`), that bundle
//! replaces the default roots for WebSocket connections and is added
//! as an extra root for the HTTP checker.

use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use tokio_tungstenite::Connector;

/// Shared TLS trust settings derived from the optional CA bundle.
#[derive(Debug)]
pub struct TlsSettings {
    /// Custom rustls config, present only when a CA bundle was given.
    tls_config: Option<Arc<rustls::ClientConfig>>,
    /// Raw PEM bytes of the bundle, for the reqwest-based HTTP checker.
    ca_pem: Option<Vec<u8>>,
}

/// Errors while loading the CA bundle.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to read CA bundle {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CA bundle {path} is not valid PEM: {source}")]
    InvalidPem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CA bundle {path} contains no usable certificates")]
    EmptyBundle { path: String },
}

impl TlsSettings {
    /// Build the trust settings from an optional CA bundle path.
    ///
    /// `None` yields the defaults: tungstenite's webpki roots and
    /// reqwest's built-in trust store.
    pub fn from_ca_path(path: Option<&Path>) -> Result<Self, TlsError> {
        let path = match path {
            Some(path) => path,
            None => {
                return Ok(Self {
                    tls_config: None,
                    ca_pem: None,
                })
            }
        };

        let display_path = path.display().to_string();
        let pem = std::fs::read(path).map_err(|source| TlsError::ReadFailed {
            path: display_path.clone(),
            source,
        })?;

        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut pem.as_slice())
            .collect::<Result<_, _>>()
            .map_err(|source| TlsError::InvalidPem {
                path: display_path.clone(),
                source,
            })?;

        let mut roots = rustls::RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if added == 0 {
            return Err(TlsError::EmptyBundle { path: display_path });
        }
        if ignored > 0 {
            tracing::warn!(path = %display_path, ignored, "Skipped unparsable certificates in CA bundle");
        }

        tracing::info!(path = %display_path, roots = added, "Loaded custom CA bundle");

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            tls_config: Some(Arc::new(config)),
            ca_pem: Some(pem),
        })
    }

    /// Connector for `tokio-tungstenite`, or `None` for the library
    /// default (webpki roots).
    pub fn connector(&self) -> Option<Connector> {
        self.tls_config
            .as_ref()
            .map(|config| Connector::Rustls(config.clone()))
    }

    /// Raw PEM bytes of the bundle, when one was loaded.
    pub fn ca_pem(&self) -> Option<&[u8]> {
        self.ca_pem.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ca_path_uses_defaults() {
        let settings = TlsSettings::from_ca_path(None).unwrap();
        assert!(settings.connector().is_none());
        assert!(settings.ca_pem().is_none());
    }

    #[test]
    fn missing_bundle_is_an_error() {
        let err = TlsSettings::from_ca_path(Some(Path::new("/nonexistent/cacert.pem"))).unwrap_err();
        assert!(matches!(err, TlsError::ReadFailed { .. }));
    }

    #[test]
    fn bundle_without_certificates_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("network-monitor-empty-bundle.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();

        let err = TlsSettings::from_ca_path(Some(&path)).unwrap_err();
        assert!(matches!(err, TlsError::EmptyBundle { .. }));

        std::fs::remove_file(&path).ok();
    }
}
