//! Worker pool regenerator
//!
//! Mints a full replacement set of worker identities sized to match the
//! retiring pool. Pool-local ids are assigned here, in creation order.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::WorkerIdentity;
use crate::error::{Result, RotorError};
use crate::guard::guard;
use crate::ledger::LedgerClient;

/// Smallest pool the engine will operate
pub const MIN_POOL_SIZE: usize = 1;
/// Largest pool the engine will operate
pub const MAX_POOL_SIZE: usize = 100;

/// Mints replacement worker pools.
pub struct PoolRegenerator<L: LedgerClient> {
    ledger: Arc<L>,
    /// Deadline for the whole batch
    batch_bound: Duration,
}

impl<L: LedgerClient> PoolRegenerator<L> {
    /// Create a regenerator with the given whole-batch bound.
    pub fn new(ledger: Arc<L>, batch_bound: Duration) -> Self {
        Self {
            ledger,
            batch_bound,
        }
    }

    /// Mint `size` new identities. Does not distribute resources.
    ///
    /// The size must match the previous pool and lie in [1,100]; that is
    /// validated before any remote call. Individual creation failures are
    /// tolerated (the batch may come back short, with a warning), but zero
    /// identities is fatal.
    pub async fn regenerate(&self, size: usize) -> Result<Vec<WorkerIdentity>> {
        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&size) {
            return Err(RotorError::Validation(format!(
                "pool size {} outside [{},{}]",
                size, MIN_POOL_SIZE, MAX_POOL_SIZE
            )));
        }

        let pool = guard(self.mint_batch(size), self.batch_bound, "regenerate").await?;

        if pool.is_empty() {
            return Err(RotorError::Fatal(
                "no identities could be created".to_string(),
            ));
        }
        if pool.len() < size {
            tracing::warn!(
                requested = size,
                created = pool.len(),
                "Regenerated pool is short"
            );
        } else {
            tracing::info!(created = pool.len(), "Worker pool regenerated");
        }
        Ok(pool)
    }

    async fn mint_batch(&self, size: usize) -> Result<Vec<WorkerIdentity>> {
        let mut pool = Vec::with_capacity(size);
        for index in 0..size {
            match self.ledger.create_identity().await {
                Ok(mut worker) => {
                    worker.id = index as u32;
                    pool.push(worker);
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "Identity creation failed");
                }
            }
        }
        Ok(pool)
    }
}
