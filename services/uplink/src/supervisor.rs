//! Connectivity supervisor: health probes and retry handling
//!
//! One probe fires immediately on startup, then the poll loop probes on
//! a fixed interval while the backend is offline. Once online, interval
//! probing stops; online state is invalidated by `handle_api_error`
//! when a domain call hits a connectivity failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::classifier::CallError;
use crate::config::BackendConfig;
use crate::io::HttpClient;
use crate::state::{current_epoch_ms, StoreHandle};

pub struct Supervisor {
    store: StoreHandle,
    http: Arc<dyn HttpClient>,
    health_url: String,
    poll_interval: Duration,
    cancel: CancellationToken,
    // Single-flight gate: at most one probe in flight at a time
    probe_gate: Mutex<()>,
}

impl Supervisor {
    pub fn new(
        store: StoreHandle,
        http: Arc<dyn HttpClient>,
        backend: &BackendConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            http,
            health_url: backend.health_url(),
            poll_interval: backend.poll_interval,
            cancel,
            probe_gate: Mutex::new(()),
        }
    }

    /// Probe immediately instead of waiting for the next interval tick.
    ///
    /// Safe to call while a probe is already in flight; the concurrent
    /// call is a no-op, so the retry count cannot be double-incremented.
    pub async fn retry_connection(&self) {
        self.probe_once().await;
    }

    /// Run one probe attempt and apply its outcome to the store.
    ///
    /// Never returns an error to the caller; probe outcomes only exist
    /// as state updates.
    async fn probe_once(&self) {
        let Ok(_guard) = self.probe_gate.try_lock() else {
            tracing::debug!("Probe already in flight, skipping");
            return;
        };

        let seq = self.store.issue_probe();
        tracing::debug!("Probing {} (seq {})", self.health_url, seq);

        match self.http.get(&self.health_url).await {
            // Any response at all means the server is reachable, even an
            // error status from the health route itself
            Ok(response) => {
                tracing::debug!("Probe seq {} got status {}", seq, response.status);
                self.store.apply_success(seq, current_epoch_ms());
            }
            Err(CallError::Http { status, .. }) => {
                tracing::debug!("Probe seq {} got error status {}", seq, status);
                self.store.apply_success(seq, current_epoch_ms());
            }
            Err(CallError::Network(detail)) => {
                tracing::debug!("Probe seq {} failed: {}", seq, detail);
                self.store.apply_failure(seq, current_epoch_ms());
            }
            Err(CallError::Cancelled) => {
                tracing::debug!("Probe seq {} cancelled, ignoring", seq);
            }
        }
    }

    /// Probe once immediately, then poll on the configured interval
    /// while offline. Returns when the cancellation token is triggered.
    pub async fn run(&self) {
        self.probe_once().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Supervisor poll loop cancelled");
                    break;
                }
            }

            if self.store.snapshot().server_online {
                continue;
            }
            self.probe_once().await;
        }
    }
}
