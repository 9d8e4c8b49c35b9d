//! Distribution engine
//!
//! Computes and executes a per-recipient allocation of a collected resource
//! pool. A successful primary-resource transfer activates the recipient;
//! failures are recorded per recipient and never abort the rest.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    DistributionOutcome, DistributionPlan, DistributionRecord, ResourceKind, WorkerIdentity,
};
use crate::error::Result;
use crate::guard::{RetryPolicy, guard_with_retry};
use crate::ledger::LedgerClient;
use crate::throttle::Throttle;

/// Executes distribution plans against the ledger.
pub struct DistributionEngine<L: LedgerClient> {
    ledger: Arc<L>,
    /// Deadline per guarded transfer
    bound: Duration,
    /// Minimum spacing between recipients
    throttle_interval: Duration,
    retry: RetryPolicy,
}

impl<L: LedgerClient> DistributionEngine<L> {
    /// Create an engine with the given per-transfer bound and pacing.
    pub fn new(
        ledger: Arc<L>,
        bound: Duration,
        throttle_interval: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            bound,
            throttle_interval,
            retry,
        }
    }

    /// Distribute `total_amount` of `kind` from `source` equally across
    /// the recipients.
    ///
    /// A non-positive amount or an empty recipient list is a no-op
    /// returning a zero outcome; no tokens collected means no token
    /// distribution attempted. The plan is validated against the
    /// never-over-distribute invariant before any remote call.
    pub async fn distribute(
        &self,
        total_amount: f64,
        source: &WorkerIdentity,
        recipients: &mut [WorkerIdentity],
        kind: ResourceKind,
    ) -> Result<DistributionOutcome> {
        if total_amount <= 0.0 || recipients.is_empty() {
            tracing::debug!(
                kind = kind.as_str(),
                total_amount,
                recipients = recipients.len(),
                "Distribution skipped"
            );
            return Ok(DistributionOutcome::noop(kind));
        }

        let plan = DistributionPlan::compute(total_amount, recipients.len())?;
        let share = plan.per_recipient_amount;

        let mut throttle = Throttle::new(self.throttle_interval);
        let mut records = Vec::with_capacity(recipients.len());
        let mut succeeded = 0usize;

        for worker in recipients.iter_mut() {
            throttle.pace().await;

            let label = match kind {
                ResourceKind::Primary => "distribute:primary",
                ResourceKind::Secondary => "distribute:secondary",
            };
            let result = guard_with_retry(
                || self.ledger.transfer(source, worker, share, kind),
                self.bound,
                label,
                &self.retry,
            )
            .await;

            match result {
                Ok(_) => {
                    succeeded += 1;
                    match kind {
                        ResourceKind::Primary => {
                            worker.primary_balance += share;
                            // Activation requires nonzero primary; share > 0 here
                            worker.active = true;
                        }
                        ResourceKind::Secondary => {
                            worker.secondary_balance += share;
                        }
                    }
                    records.push(DistributionRecord {
                        worker_id: worker.id,
                        amount: share,
                        succeeded: true,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        worker_id = worker.id,
                        kind = kind.as_str(),
                        error = %err,
                        "Transfer failed"
                    );
                    records.push(DistributionRecord {
                        worker_id: worker.id,
                        amount: share,
                        succeeded: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let failed = records.len() - succeeded;
        let outcome = DistributionOutcome {
            kind,
            distributed: share * succeeded as f64,
            succeeded,
            failed,
            records,
        };
        tracing::info!(
            kind = kind.as_str(),
            distributed = outcome.distributed,
            succeeded,
            failed,
            "Distribution phase finished"
        );
        Ok(outcome)
    }
}
