//! Trading strategy seam
//!
//! The Trading phase delegates to an opaque strategy task: given the worker
//! pool and a duration, it performs the actual work and reports resource
//! deltas. Its internal heuristics are not the orchestrator's concern.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::WorkerIdentity;
use crate::error::Result;

/// Resource deltas reported by a strategy run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrategyOutcome {
    /// Net primary resource change across the pool
    pub primary_delta: f64,
    /// Net secondary resource change across the pool
    pub secondary_delta: f64,
}

/// Opaque work executor for the Trading phase
#[async_trait]
pub trait TradingStrategy: Send + Sync {
    /// Run the strategy over the pool for the configured duration.
    async fn run(&self, pool: &[WorkerIdentity], duration: Duration) -> Result<StrategyOutcome>;

    /// Strategy identifier for logs and status output.
    fn name(&self) -> &str {
        "strategy"
    }
}

/// Strategy that holds for the duration and reports zero deltas.
///
/// Used for paper sessions where only the rotation mechanics matter.
#[derive(Debug, Default)]
pub struct HoldStrategy;

#[async_trait]
impl TradingStrategy for HoldStrategy {
    async fn run(&self, _pool: &[WorkerIdentity], duration: Duration) -> Result<StrategyOutcome> {
        tokio::time::sleep(duration).await;
        Ok(StrategyOutcome::default())
    }

    fn name(&self) -> &str {
        "hold"
    }
}
