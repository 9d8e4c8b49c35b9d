//! Per-worker collection records and the phase outcome
//!
//! The collection phase produces exactly one record per worker in the pool,
//! every lap, regardless of individual failures. A failed worker contributes
//! zero to the totals; its record carries the error.

use serde::{Deserialize, Serialize};

/// Status of one worker's sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    /// Not yet attempted
    Pending,
    /// Sweep in progress
    Collecting,
    /// Both resources swept
    Completed,
    /// Any sub-call failed; contribution to totals is zero
    Failed,
}

/// Result of sweeping one worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Pool-local worker id
    pub worker_id: u32,
    /// Sweep status
    pub status: CollectionStatus,
    /// Primary resource swept (zero unless completed)
    pub primary_collected: f64,
    /// Secondary resource swept (zero unless completed)
    pub secondary_collected: f64,
    /// Error description when failed
    pub error: Option<String>,
}

impl CollectionRecord {
    /// Create a pending record for a worker.
    pub fn pending(worker_id: u32) -> Self {
        Self {
            worker_id,
            status: CollectionStatus::Pending,
            primary_collected: 0.0,
            secondary_collected: 0.0,
            error: None,
        }
    }

    /// Mark the record completed with the swept amounts.
    pub fn complete(&mut self, primary: f64, secondary: f64) {
        self.status = CollectionStatus::Completed;
        self.primary_collected = primary;
        self.secondary_collected = secondary;
        self.error = None;
    }

    /// Mark the record failed. Collected amounts are zeroed: a failed worker
    /// contributes nothing to the phase totals.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = CollectionStatus::Failed;
        self.primary_collected = 0.0;
        self.secondary_collected = 0.0;
        self.error = Some(error.into());
    }
}

/// Outcome of the collection phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOutcome {
    /// False only when the phase could not start (empty pool)
    pub success: bool,
    /// Sum of primary over completed records
    pub total_primary_collected: f64,
    /// Sum of secondary over completed records
    pub total_secondary_collected: f64,
    /// One record per worker in the pool
    pub records: Vec<CollectionRecord>,
}

impl CollectionOutcome {
    /// Outcome for a phase that could not start.
    pub fn not_started() -> Self {
        Self {
            success: false,
            total_primary_collected: 0.0,
            total_secondary_collected: 0.0,
            records: Vec::new(),
        }
    }

    /// Build a successful outcome from per-worker records, computing totals
    /// from the completed records only.
    pub fn from_records(records: Vec<CollectionRecord>) -> Self {
        let total_primary_collected = records
            .iter()
            .filter(|r| r.status == CollectionStatus::Completed)
            .map(|r| r.primary_collected)
            .sum();
        let total_secondary_collected = records
            .iter()
            .filter(|r| r.status == CollectionStatus::Completed)
            .map(|r| r.secondary_collected)
            .sum();
        Self {
            success: true,
            total_primary_collected,
            total_secondary_collected,
            records,
        }
    }

    /// Number of workers whose sweep failed.
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == CollectionStatus::Failed)
            .count()
    }
}
