//! Environment-driven agent configuration.
//!
//! All settings come from environment variables (loaded from `.env`
//! when present). Parsing happens once at startup; any error aborts
//! the process before network activity begins.

use std::path::PathBuf;
use std::time::Duration;

use network_monitor_core::report::ProbeKind;
use network_monitor_core::types::TargetId;

/// Default interval between probe passes.
const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Default per-probe connect/request deadline.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// One configured probe target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Position in the `TARGETS` list, starting at 0.
    pub id: TargetId,
    pub kind: ProbeKind,
    /// `host:port` for TCP probes, a URL for HTTP and WebSocket probes.
    pub location: String,
}

/// Fully parsed agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Backend uplink endpoint (`ws://` or `wss://`).
    pub backend_ws_url: String,
    /// Identifier for this agent instance.
    pub monitor_id: i64,
    pub targets: Vec<TargetSpec>,
    pub check_interval: Duration,
    pub connect_timeout: Duration,
    /// Optional PEM bundle used to verify TLS targets and the uplink.
    pub ca_cert_path: Option<PathBuf>,
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("{var} must be a valid integer, got {value:?}")]
    InvalidInteger { var: &'static str, value: String },

    #[error("TARGETS must contain at least one entry")]
    NoTargets,

    #[error("Invalid target entry {entry:?}: {reason}")]
    InvalidTarget { entry: String, reason: String },
}

impl AgentConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_ws_url =
            std::env::var("BACKEND_WS_URL").map_err(|_| ConfigError::MissingVar("BACKEND_WS_URL"))?;

        let monitor_id_raw =
            std::env::var("MONITOR_ID").map_err(|_| ConfigError::MissingVar("MONITOR_ID"))?;
        let monitor_id = monitor_id_raw
            .parse()
            .map_err(|_| ConfigError::InvalidInteger {
                var: "MONITOR_ID",
                value: monitor_id_raw,
            })?;

        let targets_raw =
            std::env::var("TARGETS").map_err(|_| ConfigError::MissingVar("TARGETS"))?;
        let targets = parse_targets(&targets_raw)?;

        let check_interval = Duration::from_secs(parse_optional_u64(
            "CHECK_INTERVAL_SECS",
            DEFAULT_INTERVAL_SECS,
        )?);
        let connect_timeout = Duration::from_millis(parse_optional_u64(
            "CONNECT_TIMEOUT_MS",
            DEFAULT_CONNECT_TIMEOUT_MS,
        )?);

        let ca_cert_path = std::env::var("CA_CERT_PATH").ok().map(PathBuf::from);

        Ok(Self {
            backend_ws_url,
            monitor_id,
            targets,
            check_interval,
            connect_timeout,
            ca_cert_path,
        })
    }
}

/// Parse an optional integer environment variable, falling back to a
/// default when unset. A set-but-unparsable value is an error rather
/// than a silent fallback.
fn parse_optional_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidInteger {
            var,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Parse the comma-separated `TARGETS` list.
///
/// Each entry has the form `kind=location`:
/// - `tcp=host:port`
/// - `http=http://host/path` (or `https://`)
/// - `ws=ws://host/path` (or `wss://`)
///
/// Whitespace around entries is trimmed; empty entries are skipped.
pub fn parse_targets(raw: &str) -> Result<Vec<TargetSpec>, ConfigError> {
    let mut targets = Vec::new();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (kind_str, location) =
            entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidTarget {
                    entry: entry.to_string(),
                    reason: "expected kind=location".to_string(),
                })?;

        let kind = match kind_str.trim() {
            "tcp" => ProbeKind::Tcp,
            "http" => ProbeKind::Http,
            "ws" => ProbeKind::WebSocket,
            other => {
                return Err(ConfigError::InvalidTarget {
                    entry: entry.to_string(),
                    reason: format!("unknown probe kind {other:?} (expected tcp, http or ws)"),
                })
            }
        };

        let location = location.trim();
        if location.is_empty() {
            return Err(ConfigError::InvalidTarget {
                entry: entry.to_string(),
                reason: "empty location".to_string(),
            });
        }

        targets.push(TargetSpec {
            id: targets.len() as TargetId,
            kind,
            location: location.to_string(),
        });
    }

    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    Ok(targets)
}
