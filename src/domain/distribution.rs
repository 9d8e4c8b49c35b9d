//! Distribution plan and per-recipient records
//!
//! A DistributionPlan is the computed per-recipient allocation of a collected
//! resource pool. Plans that would over-allocate must never execute; the
//! checked constructor enforces this before any remote call.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotorError};

/// Tolerance for floating-point allocation checks
pub const ALLOCATION_EPSILON: f64 = 1e-9;

/// Which of the two transferable resources an operation moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The base transferable unit used for funding and collection
    Primary,
    /// The optional second asset distributed alongside the primary
    Secondary,
}

impl ResourceKind {
    /// Lowercase name for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Primary => "primary",
            ResourceKind::Secondary => "secondary",
        }
    }
}

/// Computed per-recipient allocation of a resource pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPlan {
    /// Total amount to allocate
    pub total_amount: f64,
    /// Equal share per recipient
    pub per_recipient_amount: f64,
    /// Number of recipients
    pub recipient_count: usize,
}

impl DistributionPlan {
    /// Compute an equal-share plan.
    ///
    /// Rejects a plan whose shares would sum past the total (beyond
    /// `ALLOCATION_EPSILON`) so an over-distributing plan can never execute.
    pub fn compute(total_amount: f64, recipient_count: usize) -> Result<Self> {
        if recipient_count == 0 {
            return Err(RotorError::Validation(
                "distribution plan requires at least one recipient".to_string(),
            ));
        }
        let per_recipient_amount = total_amount / recipient_count as f64;
        let allocated = per_recipient_amount * recipient_count as f64;
        if allocated > total_amount + ALLOCATION_EPSILON {
            return Err(RotorError::Validation(format!(
                "plan would over-allocate: {} * {} > {}",
                per_recipient_amount, recipient_count, total_amount
            )));
        }
        Ok(Self {
            total_amount,
            per_recipient_amount,
            recipient_count,
        })
    }
}

/// Result of one recipient's transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionRecord {
    /// Pool-local recipient id
    pub worker_id: u32,
    /// Amount attempted
    pub amount: f64,
    /// Whether the transfer succeeded
    pub succeeded: bool,
    /// Error description when failed
    pub error: Option<String>,
}

/// Outcome of a distribution phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionOutcome {
    /// Which resource was distributed
    pub kind: ResourceKind,
    /// Total actually distributed (per-recipient share times successes)
    pub distributed: f64,
    /// Number of successful transfers
    pub succeeded: usize,
    /// Number of failed transfers
    pub failed: usize,
    /// One record per attempted recipient
    pub records: Vec<DistributionRecord>,
}

impl DistributionOutcome {
    /// Outcome for a skipped distribution (zero amount or no recipients).
    pub fn noop(kind: ResourceKind) -> Self {
        Self {
            kind,
            distributed: 0.0,
            succeeded: 0,
            failed: 0,
            records: Vec::new(),
        }
    }

    /// True when transfers were attempted and every one of them failed.
    /// Partial failure is not total failure.
    pub fn total_failure(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }
}
