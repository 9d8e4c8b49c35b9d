//! Lap state machine
//!
//! Drives one full rotation: Trading, Collecting, Regenerating,
//! DistributingPrimary, DistributingSecondary, Validating. The run token is
//! checked at every phase boundary; a pause holds the lap there, a stop lets
//! the current lap finish. The worker pool is swapped only after validation
//! passes, so a failed lap leaves the previous pool in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::control::RunToken;
use crate::domain::{LapPhase, LapRecord, ResourceKind, WorkerIdentity};
use crate::error::RotorError;
use crate::guard::guard;
use crate::ledger::LedgerClient;
use crate::phases::{CollectionExecutor, DistributionEngine, PoolRegenerator};
use crate::strategy::TradingStrategy;

/// Extra time the trading guard allows beyond the configured duration
const TRADING_GRACE: Duration = Duration::from_secs(30);

/// Runs the lap state machine over an injected ledger and strategy.
pub struct LapOrchestrator<L: LedgerClient> {
    strategy: Arc<dyn TradingStrategy>,
    collector: CollectionExecutor<L>,
    regenerator: PoolRegenerator<L>,
    distributor: DistributionEngine<L>,
    trading_duration: Duration,
}

impl<L: LedgerClient> LapOrchestrator<L> {
    pub fn new(
        ledger: Arc<L>,
        strategy: Arc<dyn TradingStrategy>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            strategy,
            collector: CollectionExecutor::new(
                ledger.clone(),
                config.collection_bound(),
                config.throttle_interval(),
                config.retry_policy(),
            ),
            regenerator: PoolRegenerator::new(ledger.clone(), config.regeneration_bound()),
            distributor: DistributionEngine::new(
                ledger,
                config.distribution_bound(),
                config.throttle_interval(),
                config.retry_policy(),
            ),
            trading_duration: config.trading_duration(),
        }
    }

    /// Mint a fresh pool outside the lap cycle (session bootstrap).
    pub async fn mint_pool(&self, size: usize) -> crate::error::Result<Vec<WorkerIdentity>> {
        self.regenerator.regenerate(size).await
    }

    /// Distribute outside the lap cycle (session bootstrap).
    pub async fn distribute(
        &self,
        total_amount: f64,
        source: &WorkerIdentity,
        recipients: &mut [WorkerIdentity],
        kind: ResourceKind,
    ) -> crate::error::Result<crate::domain::DistributionOutcome> {
        self.distributor
            .distribute(total_amount, source, recipients, kind)
            .await
    }

    /// Sweep outside the lap cycle (session close-out).
    pub async fn sweep(
        &self,
        pool: &mut [WorkerIdentity],
        admin: &WorkerIdentity,
    ) -> crate::domain::CollectionOutcome {
        self.collector.run(pool, admin).await
    }

    /// Run one lap over `pool`, sweeping into and distributing from `admin`.
    ///
    /// On success the retired pool is replaced in place by the freshly
    /// minted one. On failure the pool is left untouched and the record
    /// carries the failing phase's reason.
    pub async fn run_lap(
        &self,
        lap_number: u64,
        pool: &mut Vec<WorkerIdentity>,
        admin: &WorkerIdentity,
        token: &RunToken,
    ) -> LapRecord {
        let mut lap = LapRecord::new(lap_number);
        tracing::info!(lap = lap_number, workers = pool.len(), "Lap started");

        // Trading
        let phase_start = Instant::now();
        let trading_result = guard(
            self.strategy.run(pool, self.trading_duration),
            self.trading_duration + TRADING_GRACE,
            "trading",
        )
        .await;
        lap.record_phase(LapPhase::Trading, phase_start.elapsed());
        match trading_result {
            Ok(outcome) => {
                tracing::debug!(
                    lap = lap_number,
                    strategy = self.strategy.name(),
                    primary_delta = outcome.primary_delta,
                    secondary_delta = outcome.secondary_delta,
                    "Trading phase finished"
                );
            }
            // Strategy failures never abort the lap: the sweep still runs
            Err(err) => {
                tracing::warn!(lap = lap_number, error = %err, "Trading phase failed");
            }
        }
        token.wait_if_paused().await;

        // Collecting
        let phase_start = Instant::now();
        let collected = self.collector.run(pool, admin).await;
        lap.record_phase(LapPhase::Collecting, phase_start.elapsed());
        if !collected.success {
            lap.finalize_failed("Collection phase failed", false);
            return lap;
        }
        lap.total_primary_collected = collected.total_primary_collected;
        lap.total_secondary_collected = collected.total_secondary_collected;
        token.wait_if_paused().await;

        // Regenerating
        let phase_start = Instant::now();
        let regen_result = self.regenerator.regenerate(pool.len()).await;
        lap.record_phase(LapPhase::Regenerating, phase_start.elapsed());
        let mut new_pool = match regen_result {
            Ok(new_pool) => new_pool,
            Err(err) => {
                let timed_out = matches!(err, RotorError::Timeout { .. });
                tracing::error!(lap = lap_number, error = %err, "Regeneration failed");
                lap.finalize_failed("Wallet regeneration failed", timed_out);
                return lap;
            }
        };
        token.wait_if_paused().await;

        // DistributingPrimary
        let phase_start = Instant::now();
        let primary_result = self
            .distributor
            .distribute(
                lap.total_primary_collected,
                admin,
                &mut new_pool,
                ResourceKind::Primary,
            )
            .await;
        lap.record_phase(LapPhase::DistributingPrimary, phase_start.elapsed());
        match primary_result {
            Ok(outcome) if outcome.total_failure() => {
                lap.finalize_failed("Distribution phase failed", false);
                return lap;
            }
            Ok(_) => {}
            Err(err) => {
                let timed_out = matches!(err, RotorError::Timeout { .. });
                tracing::error!(lap = lap_number, error = %err, "Primary distribution failed");
                lap.finalize_failed("Distribution phase failed", timed_out);
                return lap;
            }
        }
        token.wait_if_paused().await;

        // DistributingSecondary, skipped entirely at a zero total. A
        // skipped phase leaves no timing entry.
        if lap.total_secondary_collected > 0.0 {
            let phase_start = Instant::now();
            let secondary_result = self
                .distributor
                .distribute(
                    lap.total_secondary_collected,
                    admin,
                    &mut new_pool,
                    ResourceKind::Secondary,
                )
                .await;
            lap.record_phase(LapPhase::DistributingSecondary, phase_start.elapsed());
            match secondary_result {
                // Workers can trade without the secondary resource; a full
                // secondary failure degrades the lap but does not fail it
                Ok(outcome) if outcome.total_failure() => {
                    tracing::warn!(lap = lap_number, "Secondary distribution fully failed");
                }
                Ok(_) => {}
                Err(err) => {
                    let timed_out = matches!(err, RotorError::Timeout { .. });
                    tracing::error!(lap = lap_number, error = %err, "Secondary distribution failed");
                    lap.finalize_failed("Distribution phase failed", timed_out);
                    return lap;
                }
            }
        } else {
            tracing::debug!(lap = lap_number, "No secondary resource collected, skipping");
        }
        token.wait_if_paused().await;

        // Validating
        let phase_start = Instant::now();
        let active = new_pool.iter().filter(|w| w.active).count();
        lap.record_phase(LapPhase::Validating, phase_start.elapsed());
        if active == 0 {
            lap.finalize_failed("No valid wallets found after regeneration", false);
            return lap;
        }

        // Swap: retire the swept pool and rotate in the new one
        for worker in pool.iter_mut() {
            worker.retire();
        }
        lap.workers_regenerated = new_pool.len();
        *pool = new_pool;
        lap.finalize_completed();
        tracing::info!(
            lap = lap_number,
            active,
            primary = lap.total_primary_collected,
            secondary = lap.total_secondary_collected,
            "Lap completed"
        );
        lap
    }
}
