//! `network-monitor` -- lightweight network reachability daemon.
//!
//! Probes a configured set of targets (TCP connect, HTTP GET,
//! WebSocket handshake) on an interval and pushes the results to a
//! backend over WebSocket as JSON. TLS endpoints are verified against
//! the webpki roots or a custom CA bundle.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                           |
//! |-----------------------|----------|---------|---------------------------------------|
//! | `BACKEND_WS_URL`      | yes      | --      | Uplink endpoint, e.g. `wss://host:3000/ws/monitor` |
//! | `MONITOR_ID`          | yes      | --      | Integer ID for this agent             |
//! | `TARGETS`             | yes      | --      | Comma-separated probes, e.g. `tcp=host:443,http=https://host/health,ws=wss://host/ws` |
//! | `CHECK_INTERVAL_SECS` | no       | `5`     | Seconds between probe passes          |
//! | `CONNECT_TIMEOUT_MS`  | no       | `3000`  | Per-probe deadline in milliseconds    |
//! | `CA_CERT_PATH`        | no       | --      | PEM bundle for TLS verification       |

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use network_monitor_agent::config::AgentConfig;
use network_monitor_agent::runner::ProbeRunner;
use network_monitor_agent::tls::TlsSettings;
use network_monitor_agent::uplink;
use network_monitor_agent::ws::WebSocketClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "network_monitor=info,network_monitor_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let tls = match TlsSettings::from_ca_path(config.ca_cert_path.as_deref()) {
        Ok(tls) => Arc::new(tls),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load CA bundle");
            std::process::exit(1);
        }
    };

    let runner = match ProbeRunner::new(config.targets.clone(), config.connect_timeout, tls.clone())
    {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP checker");
            std::process::exit(1);
        }
    };

    tracing::info!(
        monitor_id = config.monitor_id,
        backend = %config.backend_ws_url,
        targets = runner.target_count(),
        interval_secs = config.check_interval.as_secs(),
        "Starting network-monitor",
    );

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            ctrl_c_cancel.cancel();
        }
    });

    let client = WebSocketClient::new(config.backend_ws_url.clone(), &tls);
    uplink::run(
        &client,
        config.monitor_id,
        config.check_interval,
        &runner,
        &cancel,
    )
    .await;

    tracing::info!("network-monitor stopped");
}
