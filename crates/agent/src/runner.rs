//! Concurrent probe execution.
//!
//! [`ProbeRunner`] owns the configured targets and fans one probe per
//! target out onto the runtime for every pass. Individual failures are
//! reported as `Down`/`Timeout` results; they never abort the pass.

use std::sync::Arc;
use std::time::Duration;

use network_monitor_core::report::{ProbeKind, ProbeResult};

use crate::config::TargetSpec;
use crate::http::{HttpChecker, HttpCheckerError};
use crate::tls::TlsSettings;
use crate::{tcp, ws};

/// Executes all configured probes concurrently.
pub struct ProbeRunner {
    targets: Vec<TargetSpec>,
    timeout: Duration,
    http: HttpChecker,
    tls: Arc<TlsSettings>,
}

impl ProbeRunner {
    /// Build a runner for the given targets.
    pub fn new(
        targets: Vec<TargetSpec>,
        timeout: Duration,
        tls: Arc<TlsSettings>,
    ) -> Result<Self, HttpCheckerError> {
        let http = HttpChecker::new(timeout, &tls)?;
        Ok(Self {
            targets,
            timeout,
            http,
            tls,
        })
    }

    /// Number of configured targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Probe every target concurrently and return the results in
    /// target order.
    pub async fn run_pass(&self) -> Vec<ProbeResult> {
        let futures = self.targets.iter().map(|target| self.probe_one(target));
        futures::future::join_all(futures).await
    }

    async fn probe_one(&self, target: &TargetSpec) -> ProbeResult {
        match target.kind {
            ProbeKind::Tcp => tcp::probe(&target.location, self.timeout).await,
            ProbeKind::Http => self.http.probe(&target.location).await,
            ProbeKind::WebSocket => ws::probe(&target.location, self.timeout, &self.tls).await,
        }
    }
}
