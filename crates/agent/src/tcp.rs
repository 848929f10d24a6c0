//! TCP reachability probe.
//!
//! Resolves a `host:port` spec and attempts a TCP connect within the
//! configured deadline. Resolution failures, refused connections and
//! timeouts are all reported as data, never as `Err` -- a bad target
//! must not abort a probe pass.

use std::time::{Duration, Instant};

use tokio::net::{lookup_host, TcpStream};

use network_monitor_core::report::{ProbeKind, ProbeResult};

/// Probe a `host:port` target once.
///
/// Resolution uses the system resolver; the connect attempt goes to
/// the first resolved address. The deadline covers the connect only --
/// resolution failures surface immediately as `Down`.
pub async fn probe(target: &str, timeout: Duration) -> ProbeResult {
    let start = Instant::now();

    let addr = match lookup_host(target).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                return ProbeResult::down(
                    target,
                    ProbeKind::Tcp,
                    elapsed_ms(start),
                    "resolution returned no addresses",
                );
            }
        },
        Err(e) => {
            return ProbeResult::down(
                target,
                ProbeKind::Tcp,
                elapsed_ms(start),
                format!("resolution failed: {e}"),
            );
        }
    };

    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => {
            let latency = elapsed_ms(start);
            tracing::debug!(target, %addr, latency_ms = latency, "TCP probe OK");
            ProbeResult::up(target, ProbeKind::Tcp, latency).with_resolved_addr(addr.to_string())
        }
        Ok(Err(e)) => {
            tracing::debug!(target, %addr, error = %e, "TCP probe failed");
            ProbeResult::down(
                target,
                ProbeKind::Tcp,
                elapsed_ms(start),
                format!("connect failed: {e}"),
            )
            .with_resolved_addr(addr.to_string())
        }
        Err(_) => {
            tracing::debug!(target, %addr, timeout_ms = timeout.as_millis() as u64, "TCP probe timed out");
            ProbeResult::timeout(target, ProbeKind::Tcp, elapsed_ms(start))
                .with_resolved_addr(addr.to_string())
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
