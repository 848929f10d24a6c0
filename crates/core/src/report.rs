//! Probe result data model.
//!
//! A [`ProbeResult`] is the unit of data the agent produces for every
//! configured target on every pass. Results are batched into a
//! `check_report` payload and pushed to the backend as JSON.

use serde::{Deserialize, Serialize};

/// The kind of check that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// DNS resolution + TCP connect.
    Tcp,
    /// HTTP GET against a URL.
    Http,
    /// WebSocket handshake against a `ws://` or `wss://` URL.
    WebSocket,
}

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The target answered within the deadline.
    Up,
    /// The target could not be reached (resolution failure, refused
    /// connection, transport error, or an HTTP error status).
    Down,
    /// The probe deadline elapsed before an answer arrived.
    Timeout,
}

/// Result of probing one target once.
///
/// Invariants (enforced by the constructors):
/// - `status == Up` implies `error` is `None`.
/// - `status != Up` implies `error` is `Some`.
/// - `http_status` is only populated by HTTP probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The target exactly as configured (e.g. `example.com:443`).
    pub target: String,
    pub kind: ProbeKind,
    pub status: ProbeStatus,
    /// Time from probe start to outcome, in milliseconds.
    pub latency_ms: u64,
    /// The socket address DNS resolution produced, when it succeeded.
    /// Populated even for failed connects so resolution problems can be
    /// told apart from connectivity problems.
    pub resolved_addr: Option<String>,
    /// HTTP status code, for HTTP probes that received a response.
    pub http_status: Option<u16>,
    /// Human-readable failure description for `Down`/`Timeout` results.
    pub error: Option<String>,
}

impl ProbeResult {
    /// A successful probe.
    pub fn up(target: impl Into<String>, kind: ProbeKind, latency_ms: u64) -> Self {
        Self {
            target: target.into(),
            kind,
            status: ProbeStatus::Up,
            latency_ms,
            resolved_addr: None,
            http_status: None,
            error: None,
        }
    }

    /// A failed probe (unreachable, refused, transport error).
    pub fn down(
        target: impl Into<String>,
        kind: ProbeKind,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            kind,
            status: ProbeStatus::Down,
            latency_ms,
            resolved_addr: None,
            http_status: None,
            error: Some(error.into()),
        }
    }

    /// A probe whose deadline elapsed.
    pub fn timeout(target: impl Into<String>, kind: ProbeKind, latency_ms: u64) -> Self {
        Self {
            target: target.into(),
            kind,
            status: ProbeStatus::Timeout,
            latency_ms,
            resolved_addr: None,
            http_status: None,
            error: Some("probe timed out".to_string()),
        }
    }

    /// Attach the resolved socket address.
    pub fn with_resolved_addr(mut self, addr: impl Into<String>) -> Self {
        self.resolved_addr = Some(addr.into());
        self
    }

    /// Attach the HTTP status code (HTTP probes only).
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Whether the target was reachable.
    pub fn is_up(&self) -> bool {
        self.status == ProbeStatus::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_result_has_no_error() {
        let result = ProbeResult::up("example.com:80", ProbeKind::Tcp, 12);
        assert!(result.is_up());
        assert!(result.error.is_none());
    }

    #[test]
    fn down_result_carries_error() {
        let result = ProbeResult::down("example.com:81", ProbeKind::Tcp, 3, "connection refused");
        assert!(!result.is_up());
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn timeout_result_carries_error() {
        let result = ProbeResult::timeout("10.255.255.1:80", ProbeKind::Tcp, 3000);
        assert_eq!(result.status, ProbeStatus::Timeout);
        assert!(result.error.is_some());
    }

    #[test]
    fn serializes_with_snake_case_discriminators() {
        let result = ProbeResult::up("wss://host/ws", ProbeKind::WebSocket, 40);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "web_socket");
        assert_eq!(value["status"], "up");
        assert_eq!(value["latency_ms"], 40);
        assert!(value["error"].is_null());
    }

    #[test]
    fn http_status_round_trips() {
        let result = ProbeResult::down("http://host/health", ProbeKind::Http, 25, "HTTP 503")
            .with_http_status(503);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ProbeResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.http_status, Some(503));
        assert_eq!(parsed.status, ProbeStatus::Down);
    }
}
