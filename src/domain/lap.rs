//! Lap record and phase types
//!
//! One LapRecord is produced per lap and appended to session history.
//! A record is mutable while the lap runs (phase timings accumulate) and
//! immutable once finalized.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::id::now_ms;

/// The phases of the lap state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LapPhase {
    Idle,
    Trading,
    Collecting,
    Regenerating,
    #[serde(rename = "distributing_primary")]
    DistributingPrimary,
    #[serde(rename = "distributing_secondary")]
    DistributingSecondary,
    Validating,
    Completed,
    Failed,
}

/// Status of a finished or in-flight lap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LapStatus {
    /// Lap is in progress
    Running,
    /// All phases finished and validation passed
    Completed,
    /// A phase could not produce a usable result
    Failed,
    /// The failing operation was a deadline expiry
    Timeout,
}

impl LapStatus {
    /// Returns true if the lap has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LapStatus::Running)
    }
}

/// Elapsed wall-clock time of one phase, recorded at the transition out of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    /// The phase that just ended
    pub phase: LapPhase,
    /// Wall-clock time spent in the phase
    pub elapsed_ms: u64,
}

/// One record per lap, appended to session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapRecord {
    /// 1-based lap counter within the session
    pub lap_number: u64,
    /// Lap start (ms since epoch)
    pub started_at: i64,
    /// Lap end; None while running
    pub ended_at: Option<i64>,
    /// Sum of primary resource swept from workers with completed records
    pub total_primary_collected: f64,
    /// Sum of secondary resource swept from workers with completed records
    pub total_secondary_collected: f64,
    /// Size of the replacement pool actually minted
    pub workers_regenerated: usize,
    /// Current status
    pub status: LapStatus,
    /// Human-readable reason when status is failed/timeout
    pub error_message: Option<String>,
    /// Wall-clock time per phase, one entry per transition
    pub phase_timings: Vec<PhaseTiming>,
}

impl LapRecord {
    /// Start a new lap record in the running state.
    pub fn new(lap_number: u64) -> Self {
        Self {
            lap_number,
            started_at: now_ms(),
            ended_at: None,
            total_primary_collected: 0.0,
            total_secondary_collected: 0.0,
            workers_regenerated: 0,
            status: LapStatus::Running,
            error_message: None,
            phase_timings: Vec::new(),
        }
    }

    /// Record the elapsed wall-clock time of a phase that just ended.
    pub fn record_phase(&mut self, phase: LapPhase, elapsed: Duration) {
        self.phase_timings.push(PhaseTiming {
            phase,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    /// Finalize the lap as completed. The record is immutable afterwards.
    pub fn finalize_completed(&mut self) {
        self.status = LapStatus::Completed;
        self.ended_at = Some(now_ms());
    }

    /// Finalize the lap as failed with a human-readable reason.
    ///
    /// `timed_out` selects the timeout status variant when the terminal
    /// failure was a deadline expiry.
    pub fn finalize_failed(&mut self, reason: impl Into<String>, timed_out: bool) {
        self.status = if timed_out {
            LapStatus::Timeout
        } else {
            LapStatus::Failed
        };
        self.error_message = Some(reason.into());
        self.ended_at = Some(now_ms());
    }
}
