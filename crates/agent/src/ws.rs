//! WebSocket client.
//!
//! [`WebSocketClient`] holds the connection configuration for a single
//! WebSocket endpoint (the backend uplink or a probed target). Call
//! [`WebSocketClient::connect`] to establish a live [`WsConnection`].
//! TLS endpoints (`wss://`) are verified against the webpki roots or,
//! when configured, the custom CA bundle.

use std::time::{Duration, Instant};

use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream};

use network_monitor_core::report::{ProbeKind, ProbeResult};

use crate::tls::TlsSettings;

/// Configuration handle for one WebSocket endpoint.
pub struct WebSocketClient {
    url: String,
    connector: Option<Connector>,
}

/// A live WebSocket connection.
pub struct WsConnection {
    /// The raw WebSocket stream for reading/writing frames.
    pub stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// Failed to establish the connection (TCP, TLS or handshake).
    #[error("Connection error: {0}")]
    Connection(String),
}

impl WebSocketClient {
    /// Create a new client targeting `url` with the given trust
    /// settings.
    pub fn new(url: String, tls: &TlsSettings) -> Self {
        Self {
            url,
            connector: tls.connector(),
        }
    }

    /// Endpoint URL this client connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect to the endpoint, performing the TLS and WebSocket
    /// handshakes.
    pub async fn connect(&self) -> Result<WsConnection, WsError> {
        let (stream, _response) =
            connect_async_tls_with_config(self.url.as_str(), None, false, self.connector.clone())
                .await
                .map_err(|e| {
                    WsError::Connection(format!("Failed to connect to {}: {e}", self.url))
                })?;

        tracing::info!(url = %self.url, "WebSocket connected");

        Ok(WsConnection { stream })
    }
}

/// Probe a WebSocket URL once: perform the full handshake within the
/// deadline, then close the connection cleanly.
pub async fn probe(url: &str, timeout: Duration, tls: &TlsSettings) -> ProbeResult {
    let start = Instant::now();
    let client = WebSocketClient::new(url.to_string(), tls);

    match tokio::time::timeout(timeout, client.connect()).await {
        Ok(Ok(mut conn)) => {
            let latency = start.elapsed().as_millis() as u64;
            // Best-effort clean close; the handshake already proved the
            // endpoint is up.
            conn.stream.close(None).await.ok();
            ProbeResult::up(url, ProbeKind::WebSocket, latency)
        }
        Ok(Err(e)) => {
            tracing::debug!(url, error = %e, "WebSocket probe failed");
            ProbeResult::down(
                url,
                ProbeKind::WebSocket,
                start.elapsed().as_millis() as u64,
                e.to_string(),
            )
        }
        Err(_) => {
            tracing::debug!(url, timeout_ms = timeout.as_millis() as u64, "WebSocket probe timed out");
            ProbeResult::timeout(url, ProbeKind::WebSocket, start.elapsed().as_millis() as u64)
        }
    }
}
