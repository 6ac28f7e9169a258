//! Shared connectivity state for the whole process
//!
//! Single writer role (the supervisor's probes and `handle_api_error`),
//! many readers (every screen and the dashboard). Readers subscribe via
//! a watch channel so screens blocked on connectivity wake up on
//! recovery instead of polling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::watch;

use crate::classifier::{classify, CallError, Classification};

/// The process-wide connectivity bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityState {
    /// True once a probe has succeeded and no failure has been seen since
    pub server_online: bool,
    /// True until the first probe completes, success or failure
    pub initial_check: bool,
    /// Wall-clock time of the most recent applied probe, ms since epoch
    pub last_checked_epoch_ms: u64,
    /// Consecutive failed probes since the last success
    pub retry_count: u32,
    /// Highest probe sequence number applied so far
    #[serde(skip)]
    applied_seq: u64,
}

impl ConnectivityState {
    fn unchecked() -> Self {
        Self {
            server_online: false,
            initial_check: true,
            last_checked_epoch_ms: 0,
            retry_count: 0,
            applied_seq: 0,
        }
    }
}

/// Single source of truth for connectivity.
///
/// Probes are tagged with a monotonic sequence number at issue time; a
/// completion whose sequence is not newer than the highest already
/// applied is dropped, so a stale failure cannot overwrite a fresher
/// success.
#[derive(Debug)]
pub struct ConnectivityStore {
    tx: watch::Sender<ConnectivityState>,
    next_seq: AtomicU64,
}

impl ConnectivityStore {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(ConnectivityState::unchecked()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Allocate a sequence number for a probe that is about to start
    pub fn issue_probe(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a successful probe completion. Returns false if stale.
    pub fn apply_success(&self, seq: u64, now_ms: u64) -> bool {
        self.tx.send_if_modified(|state| {
            if seq <= state.applied_seq {
                tracing::debug!("Ignoring stale probe success (seq {})", seq);
                return false;
            }
            state.applied_seq = seq;
            state.server_online = true;
            state.initial_check = false;
            state.retry_count = 0;
            state.last_checked_epoch_ms = state.last_checked_epoch_ms.max(now_ms);
            true
        })
    }

    /// Apply a failed probe completion. Returns false if stale.
    pub fn apply_failure(&self, seq: u64, now_ms: u64) -> bool {
        self.tx.send_if_modified(|state| {
            if seq <= state.applied_seq {
                tracing::debug!("Ignoring stale probe failure (seq {})", seq);
                return false;
            }
            state.applied_seq = seq;
            state.server_online = false;
            state.initial_check = false;
            state.retry_count += 1;
            state.last_checked_epoch_ms = state.last_checked_epoch_ms.max(now_ms);
            true
        })
    }

    /// Classify a failed backend call and update connectivity if it
    /// shows the server is unreachable.
    ///
    /// Application-level errors and cancellations leave the state
    /// untouched; the classification is returned either way so the
    /// caller can decide what to render.
    pub fn handle_api_error(&self, error: &CallError) -> Classification {
        let classification = classify(error);
        if classification.is_server_down() {
            tracing::warn!("Backend call failed with connectivity error: {}", error);
            let seq = self.issue_probe();
            self.apply_failure(seq, current_epoch_ms());
        }
        classification
    }

    /// Current state, cloned
    pub fn snapshot(&self) -> ConnectivityState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }

    /// Wait until the first probe has completed.
    ///
    /// Screens gate their initial data fetch on this so they neither
    /// flash an offline state nor fetch against a dead backend before
    /// anything is known.
    pub async fn wait_until_checked(&self) {
        let mut rx = self.subscribe();
        while rx.borrow_and_update().initial_check {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ConnectivityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared store handle
pub type StoreHandle = Arc<ConnectivityStore>;

pub fn new_store_handle() -> StoreHandle {
    Arc::new(ConnectivityStore::new())
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
