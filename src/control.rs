//! Run control for the orchestrator
//!
//! `RunToken` replaces a global mutable run flag: an explicit cloneable
//! token passed into every orchestrator call and polled at phase boundaries.
//! Pausing stops the orchestrator from entering the next phase but never
//! aborts an in-flight external call; stopping prevents further laps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Stage;

/// Interval at which a paused orchestrator re-checks the token
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct TokenState {
    stopped: AtomicBool,
    paused: AtomicBool,
}

/// Explicit cancellation/pause token, polled at phase boundaries.
#[derive(Debug, Clone, Default)]
pub struct RunToken {
    state: Arc<TokenState>,
}

impl RunToken {
    /// Create a fresh token in the running, unpaused state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent: stopping an already-stopped token is a
    /// success, not an error.
    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }

    /// Request a pause at the next phase boundary.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    /// Clear a pause.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    /// True while paused.
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    /// Block at a phase boundary while paused. Returns early if a stop is
    /// requested so a paused session can still be shut down.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stopped() {
            tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
        }
    }
}

/// Snapshot of engine state for the operator.
///
/// Mutating control calls acknowledge immediately; failures surface only
/// here and in session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// True while the session task is alive
    pub running: bool,
    /// Lap currently in progress (0 before the first lap)
    pub current_lap: u64,
    /// The run flag: false once a stop was requested or a fatal error
    /// cleared it
    pub global_flag: bool,
    /// Effective session stage, when a checkpoint exists
    pub stage: Option<Stage>,
    /// Reason for the most recent session-terminating failure
    pub last_error: Option<String>,
}
