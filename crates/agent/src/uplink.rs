//! Backend uplink: WebSocket connection and report push loop.
//!
//! Connects to the backend WebSocket endpoint, periodically runs a
//! probe pass via [`ProbeRunner`](crate::runner::ProbeRunner), and
//! pushes the results as JSON. Also listens for incoming commands
//! (e.g. an immediate check) from the backend.
//!
//! Connection loss is handled with a session-aware delay schedule:
//! the delay between attempts grows after every failed connect *and*
//! after every short-lived session, and only resets once a session
//! has stayed up long enough to count as stable. A backend that
//! accepts and immediately drops connections therefore backs the
//! agent off instead of driving a hot reconnect loop.

use std::time::{Duration, Instant};

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use network_monitor_core::report::ProbeResult;
use network_monitor_core::wire::MSG_TYPE_CHECK_REPORT;

use crate::runner::ProbeRunner;
use crate::ws::WebSocketClient;

/// Delay before the first reconnection attempt.
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the delay between attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// A session must survive this long before the delay schedule resets.
const STABLE_SESSION: Duration = Duration::from_secs(30);

/// Outgoing report payload sent to the backend.
#[derive(Debug, Serialize)]
struct CheckReportPayload<'a> {
    r#type: &'static str,
    monitor_id: i64,
    results: &'a [ProbeResult],
    timestamp: String,
}

/// Envelope for incoming messages from the backend.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum IncomingMessage {
    /// Run a probe pass immediately, outside the regular interval.
    #[serde(rename = "check_now")]
    CheckNow,
}

/// Reconnect delay schedule for the uplink.
struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            delay: INITIAL_RECONNECT_DELAY,
        }
    }

    /// Delay to wait before the next attempt. Each call doubles the
    /// following delay, clamped to [`MAX_RECONNECT_DELAY`].
    fn next_delay(&mut self) -> Duration {
        let current = self.delay;
        self.delay = (current * 2).min(MAX_RECONNECT_DELAY);
        current
    }

    /// Record how long the last session stayed up. Stable sessions
    /// restart the schedule from [`INITIAL_RECONNECT_DELAY`]; anything
    /// shorter keeps the delay growing.
    fn note_session(&mut self, kept_alive: Duration) {
        if kept_alive >= STABLE_SESSION {
            self.delay = INITIAL_RECONNECT_DELAY;
        }
    }
}

/// Run the uplink indefinitely.
///
/// Reconnects on connection loss, waiting out the delay schedule
/// between attempts. Returns only when `cancel` is triggered.
pub async fn run(
    client: &WebSocketClient,
    monitor_id: i64,
    interval: Duration,
    runner: &ProbeRunner,
    cancel: &CancellationToken,
) {
    let mut backoff = Backoff::new();

    loop {
        tracing::info!(url = %client.url(), "Connecting to backend");

        let conn = tokio::select! {
            _ = cancel.cancelled() => return,
            result = client.connect() => match result {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(url = %client.url(), error = %e, "Connect failed");
                    if !sleep_unless_cancelled(backoff.next_delay(), cancel).await {
                        return;
                    }
                    continue;
                }
            }
        };

        let started = Instant::now();
        run_session(conn.stream, monitor_id, interval, runner, cancel).await;
        if cancel.is_cancelled() {
            return;
        }

        backoff.note_session(started.elapsed());
        let delay = backoff.next_delay();
        tracing::warn!(
            session_secs = started.elapsed().as_secs(),
            delay_ms = delay.as_millis() as u64,
            "Uplink session ended, reconnecting",
        );
        if !sleep_unless_cancelled(delay, cancel).await {
            return;
        }
    }
}

/// Sleep for `delay`, returning `false` if cancellation wins the race.
async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Drive a single uplink session: push reports on a timer and handle
/// incoming commands via `tokio::select!`.
async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    monitor_id: i64,
    interval: Duration,
    runner: &ProbeRunner,
    cancel: &CancellationToken,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Shutdown requested, closing uplink");
                sink.send(Message::Close(None)).await.ok();
                return;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_and_report(&mut sink, monitor_id, runner).await {
                    tracing::error!(error = %e, "Failed to send report");
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if handle_incoming(&mut sink, monitor_id, runner, &text).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Backend closed the uplink");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary / Frame — ignore.
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Uplink receive error");
                        break;
                    }
                    None => {
                        tracing::info!("Uplink stream exhausted");
                        break;
                    }
                }
            }
        }
    }
}

/// Run a probe pass and send the results as a JSON text frame.
async fn run_and_report<S>(
    sink: &mut S,
    monitor_id: i64,
    runner: &ProbeRunner,
) -> Result<(), tokio_tungstenite::tungstenite::Error>
where
    S: SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let results = runner.run_pass().await;

    let up = results.iter().filter(|r| r.is_up()).count();
    tracing::info!(monitor_id, up, total = results.len(), "Probe pass complete");

    let payload = CheckReportPayload {
        r#type: MSG_TYPE_CHECK_REPORT,
        monitor_id,
        results: &results,
        timestamp: Utc::now().to_rfc3339(),
    };

    let json = serde_json::to_string(&payload).expect("CheckReportPayload is always serialisable");
    sink.send(Message::Text(json)).await
}

/// Parse and dispatch an incoming text message from the backend.
///
/// Returns `Err` only when a resulting send fails (the session should
/// end); malformed messages are logged and ignored.
async fn handle_incoming<S>(
    sink: &mut S,
    monitor_id: i64,
    runner: &ProbeRunner,
    text: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error>
where
    S: SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    match serde_json::from_str::<IncomingMessage>(text) {
        Ok(IncomingMessage::CheckNow) => {
            tracing::info!("Received immediate-check command");
            run_and_report(sink, monitor_id, runner).await
        }
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "Unknown or malformed incoming message");
            Ok(())
        }
    }
}
