//! Session-level lap result aggregation
//!
//! Accumulates per-lap outcomes into the counters an operator sees in
//! status output and end-of-session reporting.

use serde::{Deserialize, Serialize};

use crate::domain::{LapRecord, LapStatus};

/// Running totals across the laps of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Laps finished, successfully or not
    pub laps_run: u64,
    /// Laps that reached Completed
    pub laps_completed: u64,
    /// Laps that ended Failed or Timeout
    pub laps_failed: u64,
    /// Primary resource swept across all laps
    pub total_primary_collected: f64,
    /// Secondary resource swept across all laps
    pub total_secondary_collected: f64,
    /// Worker identities minted across all laps
    pub workers_regenerated: u64,
}

impl SessionSummary {
    /// Create zeroed totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished lap into the totals.
    pub fn record(&mut self, lap: &LapRecord) {
        self.laps_run += 1;
        match lap.status {
            LapStatus::Completed => self.laps_completed += 1,
            LapStatus::Failed | LapStatus::Timeout => self.laps_failed += 1,
            LapStatus::Running => {}
        }
        self.total_primary_collected += lap.total_primary_collected;
        self.total_secondary_collected += lap.total_secondary_collected;
        self.workers_regenerated += lap.workers_regenerated as u64;
    }
}
