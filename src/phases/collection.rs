//! Collection phase executor
//!
//! Sweeps primary and secondary resources from every worker in the active
//! pool to the admin identity. Every worker is attempted exactly once per
//! lap, in index order, regardless of individual failures.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{CollectionOutcome, CollectionRecord, CollectionStatus, ResourceKind, WorkerIdentity};
use crate::guard::{RetryPolicy, guard_with_retry};
use crate::ledger::LedgerClient;
use crate::throttle::Throttle;

/// Sweeps the active pool into the admin identity.
pub struct CollectionExecutor<L: LedgerClient> {
    ledger: Arc<L>,
    /// Deadline per guarded ledger call
    bound: Duration,
    /// Minimum spacing between workers
    throttle_interval: Duration,
    retry: RetryPolicy,
}

impl<L: LedgerClient> CollectionExecutor<L> {
    /// Create an executor with the given per-call bound and pacing.
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

    /// Run the collection phase over the pool.
    ///
    /// The outcome's `success` is false only when the phase cannot start
    /// (empty pool). Individual failures leave `status = failed` records
    /// with zero contribution and processing continues.
    pub async fn run(
        &self,
        pool: &mut [WorkerIdentity],
        admin: &WorkerIdentity,
    ) -> CollectionOutcome {
        if pool.is_empty() {
            tracing::warn!("Collection phase cannot start: pool is empty");
            return CollectionOutcome::not_started();
        }

        let mut throttle = Throttle::new(self.throttle_interval);
        let mut records = Vec::with_capacity(pool.len());

        for worker in pool.iter_mut() {
            throttle.pace().await;

            let mut record = CollectionRecord::pending(worker.id);
            record.status = CollectionStatus::Collecting;

            match self.sweep_worker(worker, admin).await {
                Ok((primary, secondary)) => {
                    worker.primary_balance = 0.0;
                    worker.secondary_balance = 0.0;
                    record.complete(primary, secondary);
                    tracing::debug!(
                        worker_id = worker.id,
                        primary,
                        secondary,
                        "Worker swept"
                    );
                }
                Err(err) => {
                    tracing::warn!(worker_id = worker.id, error = %err, "Worker sweep failed");
                    record.fail(err.to_string());
                }
            }
            records.push(record);
        }

        let outcome = CollectionOutcome::from_records(records);
        tracing::info!(
            workers = pool.len(),
            failed = outcome.failed_count(),
            total_primary = outcome.total_primary_collected,
            total_secondary = outcome.total_secondary_collected,
            "Collection phase finished"
        );
        outcome
    }

    /// Sweep one worker: read its balances, then transfer each nonzero
    /// resource to the admin. Any failing sub-call fails the whole worker.
    async fn sweep_worker(
        &self,
        worker: &WorkerIdentity,
        admin: &WorkerIdentity,
    ) -> crate::error::Result<(f64, f64)> {
        let (primary, secondary) = guard_with_retry(
            || self.ledger.get_balance(worker),
            self.bound,
            "collect:balance",
            &self.retry,
        )
        .await?;

        if primary > 0.0 {
            guard_with_retry(
                || self.ledger.transfer(worker, admin, primary, ResourceKind::Primary),
                self.bound,
                "collect:primary",
                &self.retry,
            )
            .await?;
        }
        if secondary > 0.0 {
            guard_with_retry(
                || self.ledger.transfer(worker, admin, secondary, ResourceKind::Secondary),
                self.bound,
                "collect:secondary",
                &self.retry,
            )
            .await?;
        }

        Ok((primary, secondary))
    }
}
