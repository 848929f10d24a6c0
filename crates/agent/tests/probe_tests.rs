//! Integration tests for the TCP, HTTP and WebSocket probes.
//!
//! Exercises real sockets on the loopback interface; no external
//! network access is required. HTTP targets are served by a one-shot
//! loopback listener that answers with a canned response.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use network_monitor_agent::http::HttpChecker;
use network_monitor_agent::{tcp, tls::TlsSettings, ws};
use network_monitor_core::report::{ProbeKind, ProbeStatus};

const TIMEOUT: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// TCP probe
// ---------------------------------------------------------------------------

/// A live listener on the loopback interface is reported `Up` with the
/// resolved address populated.
#[tokio::test]
async fn tcp_probe_live_listener_is_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let result = tcp::probe(&addr.to_string(), TIMEOUT).await;

    assert_eq!(result.kind, ProbeKind::Tcp);
    assert_eq!(result.status, ProbeStatus::Up);
    assert!(result.error.is_none());
    assert_eq!(result.resolved_addr.as_deref(), Some(addr.to_string().as_str()));
}

/// A closed port is reported `Down` with a connect error, but the
/// resolved address is still recorded.
#[tokio::test]
async fn tcp_probe_closed_port_is_down() {
    // Bind then drop to obtain a port that is very likely closed.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = tcp::probe(&addr.to_string(), TIMEOUT).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.error.is_some());
    assert_eq!(result.resolved_addr.as_deref(), Some(addr.to_string().as_str()));
}

/// An unresolvable hostname is reported `Down` with no resolved
/// address, so resolution failures can be told apart from
/// connectivity failures.
#[tokio::test]
async fn tcp_probe_unresolvable_host_is_down_without_addr() {
    // `.invalid` is reserved (RFC 2606) and never resolves.
    let result = tcp::probe("no-such-host.invalid:80", TIMEOUT).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.resolved_addr.is_none());
    assert!(result.error.as_deref().unwrap().contains("resolution"));
}

/// A spec without a port cannot be resolved into a socket address.
#[tokio::test]
async fn tcp_probe_missing_port_is_down() {
    let result = tcp::probe("127.0.0.1", TIMEOUT).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.error.is_some());
}

// ---------------------------------------------------------------------------
// HTTP probe
// ---------------------------------------------------------------------------

/// Serve exactly one HTTP request with a canned response, then close.
async fn serve_one_response(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Read the request head before answering.
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    addr
}

fn http_checker() -> HttpChecker {
    let tls = TlsSettings::from_ca_path(None).unwrap();
    HttpChecker::new(TIMEOUT, &tls).unwrap()
}

/// A 2xx response is reported `Up` with the status code recorded.
#[tokio::test]
async fn http_probe_ok_response_is_up() {
    let addr = serve_one_response(
        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
    )
    .await;

    let result = http_checker().probe(&format!("http://{addr}/health")).await;

    assert_eq!(result.kind, ProbeKind::Http);
    assert_eq!(result.status, ProbeStatus::Up);
    assert_eq!(result.http_status, Some(200));
    assert!(result.error.is_none());
}

/// A 5xx response means the host is reachable but failing: `Down`
/// with the status code recorded so the backend can tell the two
/// apart.
#[tokio::test]
async fn http_probe_error_status_is_down_with_status() {
    let addr = serve_one_response(
        "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
    )
    .await;

    let result = http_checker().probe(&format!("http://{addr}/health")).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert_eq!(result.http_status, Some(503));
    assert_eq!(result.error.as_deref(), Some("HTTP 503"));
}

/// A server that accepts the connection but never answers trips the
/// request deadline.
#[tokio::test]
async fn http_probe_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let result = http_checker().probe(&format!("http://{addr}/")).await;

    assert_eq!(result.status, ProbeStatus::Timeout);
    assert!(result.http_status.is_none());

    server.abort();
}

/// A closed port is a transport failure: `Down` with no status code.
#[tokio::test]
async fn http_probe_closed_port_is_down() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = http_checker().probe(&format!("http://{addr}/")).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.http_status.is_none());
    assert!(result.error.is_some());
}

// ---------------------------------------------------------------------------
// WebSocket probe
// ---------------------------------------------------------------------------

/// A WebSocket probe against a closed port fails the handshake and is
/// reported `Down`.
#[tokio::test]
async fn ws_probe_closed_port_is_down() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let tls = TlsSettings::from_ca_path(None).unwrap();
    let result = ws::probe(&format!("ws://{addr}/ws"), TIMEOUT, &tls).await;

    assert_eq!(result.kind, ProbeKind::WebSocket);
    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.error.is_some());
}

/// A peer that accepts the TCP connection but never answers the
/// handshake trips the probe deadline.
#[tokio::test]
async fn ws_probe_silent_peer_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept connections but never speak HTTP.
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let tls = TlsSettings::from_ca_path(None).unwrap();
    let result = ws::probe(&format!("ws://{addr}/ws"), TIMEOUT, &tls).await;

    assert_eq!(result.status, ProbeStatus::Timeout);

    server.abort();
}
