//! Session engine and control surface
//!
//! Owns one background session task. The control calls (start, pause,
//! resume, stop, restart_from, status) acknowledge immediately; execution
//! failures surface through `status` and the lap history. A session runs
//! the six-stage bootstrap, resumable from its checkpoint, then loops laps
//! until stopped, a lap limit is reached, or a fatal error ends it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::aggregate::SessionSummary;
use crate::config::EngineConfig;
use crate::control::{EngineStatus, RunToken};
use crate::domain::{LapRecord, LapStatus, ResourceKind, SessionCheckpoint, Stage, WorkerIdentity};
use crate::error::{Result, RotorError};
use crate::guard::guard_with_retry;
use crate::id::generate_session_ref;
use crate::ledger::LedgerClient;
use crate::market::MarketDataProvider;
use crate::orchestrator::lap::LapOrchestrator;
use crate::session::{CheckpointManager, SessionStore};
use crate::strategy::TradingStrategy;

struct Shared {
    token: RunToken,
    handle: Option<JoinHandle<()>>,
    session_ref: Option<String>,
    current_lap: u64,
    stage: Option<Stage>,
    last_error: Option<String>,
    summary: SessionSummary,
    history: Vec<LapRecord>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            token: RunToken::new(),
            handle: None,
            session_ref: None,
            current_lap: 0,
            stage: None,
            last_error: None,
            summary: SessionSummary::new(),
            history: Vec::new(),
        }
    }
}

struct EngineInner<L, M, S>
where
    L: LedgerClient,
    M: MarketDataProvider,
    S: SessionStore,
{
    ledger: Arc<L>,
    market: Arc<M>,
    checkpoints: CheckpointManager<S>,
    orchestrator: LapOrchestrator<L>,
    config: EngineConfig,
    shared: Mutex<Shared>,
}

impl<L, M, S> EngineInner<L, M, S>
where
    L: LedgerClient,
    M: MarketDataProvider,
    S: SessionStore,
{
    // Lock recovery: shared holds plain data, a panicked writer leaves
    // nothing half-applied that matters here
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_stage(&self, stage: Stage) {
        self.lock().stage = Some(stage);
    }
}

/// One engine, at most one live session task.
pub struct SessionEngine<L, M, S>
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    inner: Arc<EngineInner<L, M, S>>,
}

impl<L, M, S> SessionEngine<L, M, S>
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    pub fn new(
        ledger: Arc<L>,
        market: Arc<M>,
        store: Arc<S>,
        strategy: Arc<dyn TradingStrategy>,
        config: EngineConfig,
    ) -> Self {
        let orchestrator = LapOrchestrator::new(ledger.clone(), strategy, &config);
        Self {
            inner: Arc::new(EngineInner {
                ledger,
                market,
                checkpoints: CheckpointManager::new(store),
                orchestrator,
                config,
                shared: Mutex::new(Shared::default()),
            }),
        }
    }

    /// Start a session task. With a `session_ref` the session resumes from
    /// its checkpoint; without one a fresh reference is generated. Returns
    /// the reference once the task is spawned.
    pub fn start(&self, session_ref: Option<&str>) -> Result<String> {
        let mut shared = self.inner.lock();
        if shared.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(RotorError::InvalidState(
                "a session is already running".to_string(),
            ));
        }

        let session_ref = session_ref
            .map(str::to_string)
            .unwrap_or_else(generate_session_ref);
        let token = RunToken::new();

        shared.token = token.clone();
        shared.session_ref = Some(session_ref.clone());
        shared.current_lap = 0;
        shared.stage = None;
        shared.last_error = None;
        shared.summary = SessionSummary::new();
        shared.history = Vec::new();
        shared.handle = Some(tokio::spawn(run_session(
            self.inner.clone(),
            token,
            session_ref.clone(),
        )));

        tracing::info!(session = %session_ref, "Session task started");
        Ok(session_ref)
    }

    /// Hold the session at its next phase boundary. No-op when idle.
    pub fn pause(&self) {
        self.inner.lock().token.pause();
    }

    /// Release a pause. No-op when not paused.
    pub fn resume(&self) {
        self.inner.lock().token.resume();
    }

    /// Request a stop. The current lap finishes, the pool is swept, and the
    /// task exits. Stopping an idle or already-stopped engine is a success.
    pub fn stop(&self) {
        self.inner.lock().token.stop();
    }

    /// Reset a stopped session's checkpoint to an earlier stage. The next
    /// `start` with the same reference re-executes from there.
    pub async fn restart_from(&self, session_ref: &str, stage_number: u8) -> Result<Stage> {
        {
            let shared = self.inner.lock();
            if shared.handle.as_ref().is_some_and(|h| !h.is_finished()) {
                return Err(RotorError::InvalidState(
                    "cannot restart while a session is running".to_string(),
                ));
            }
        }
        let stage = Stage::from_u8(stage_number)?;
        let checkpoint = self.inner.checkpoints.restart_from(session_ref, stage).await?;

        let mut shared = self.inner.lock();
        shared.session_ref = Some(session_ref.to_string());
        shared.stage = Some(checkpoint.stage);
        Ok(checkpoint.stage)
    }

    /// Snapshot of the engine for the operator.
    pub fn status(&self) -> EngineStatus {
        let shared = self.inner.lock();
        EngineStatus {
            running: shared.handle.as_ref().is_some_and(|h| !h.is_finished()),
            current_lap: shared.current_lap,
            global_flag: !shared.token.is_stopped(),
            stage: shared.stage,
            last_error: shared.last_error.clone(),
        }
    }

    /// Lap history of the current run.
    pub fn history(&self) -> Vec<LapRecord> {
        self.inner.lock().history.clone()
    }

    /// Aggregated totals of the current run.
    pub fn summary(&self) -> SessionSummary {
        self.inner.lock().summary.clone()
    }

    /// Wait for the session task to exit.
    pub async fn wait(&self) {
        let handle = self.inner.lock().handle.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Session task panicked");
            }
        }
    }
}

async fn run_session<L, M, S>(inner: Arc<EngineInner<L, M, S>>, token: RunToken, session_ref: String)
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    if let Err(err) = drive_session(&inner, &token, &session_ref).await {
        tracing::error!(session = %session_ref, error = %err, "Session ended with error");
        let mut shared = inner.lock();
        shared.last_error = Some(err.to_string());
        shared.token.stop();
    }
}

/// Execute the six-stage bootstrap from wherever the checkpoint left off,
/// then loop laps until stop, lap limit, or fatal failure.
async fn drive_session<L, M, S>(
    inner: &Arc<EngineInner<L, M, S>>,
    token: &RunToken,
    session_ref: &str,
) -> Result<()>
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    let mut checkpoint = load_or_create(inner, session_ref).await?;
    inner.set_stage(checkpoint.stage);

    if checkpoint.stage == Stage::AccountsSwept {
        tracing::info!(session = %session_ref, "Session already swept, nothing to do");
        return Ok(());
    }

    // Stage 2: admin identity
    if checkpoint.stage < Stage::AdminCreated {
        let admin = guard_with_retry(
            || inner.ledger.create_identity(),
            inner.config.regeneration_bound(),
            "bootstrap:admin",
            &inner.config.retry_policy(),
        )
        .await?;
        checkpoint.admin = Some(admin);
        inner.checkpoints.advance(&mut checkpoint, Stage::AdminCreated).await?;
        inner.set_stage(checkpoint.stage);
    }
    let admin = checkpoint
        .admin
        .clone()
        .ok_or_else(|| RotorError::InvalidState("checkpoint has no admin identity".to_string()))?;

    // Stage 3: worker pool, appended to the stored document as minted
    if checkpoint.stage < Stage::PoolGenerated {
        let pool = inner.orchestrator.mint_pool(inner.config.pool_size).await?;
        inner.checkpoints.append_workers(&pool, session_ref).await?;
        checkpoint.pool.extend(pool);
        inner.checkpoints.advance(&mut checkpoint, Stage::PoolGenerated).await?;
        inner.set_stage(checkpoint.stage);
    }

    // Stage 4: seed the pool with the admin's primary holdings
    if checkpoint.stage < Stage::PrimaryDistributed {
        let (primary, _) = guard_with_retry(
            || inner.ledger.get_balance(&admin),
            inner.config.collection_bound(),
            "bootstrap:balance",
            &inner.config.retry_policy(),
        )
        .await?;
        let outcome = inner
            .orchestrator
            .distribute(primary, &admin, &mut checkpoint.pool, ResourceKind::Primary)
            .await?;
        if outcome.total_failure() {
            return Err(RotorError::Fatal(
                "initial primary distribution failed for every worker".to_string(),
            ));
        }
        inner
            .checkpoints
            .advance(&mut checkpoint, Stage::PrimaryDistributed)
            .await?;
        inner.set_stage(checkpoint.stage);
    }

    // Stage 5: secondary holdings, skipped entirely at zero
    if checkpoint.stage < Stage::SecondaryDistributed {
        let (_, secondary) = guard_with_retry(
            || inner.ledger.get_balance(&admin),
            inner.config.collection_bound(),
            "bootstrap:balance",
            &inner.config.retry_policy(),
        )
        .await?;
        if secondary > 0.0 {
            inner
                .orchestrator
                .distribute(secondary, &admin, &mut checkpoint.pool, ResourceKind::Secondary)
                .await?;
        } else {
            tracing::info!(session = %session_ref, "Admin holds no secondary resource, skipping");
        }
        inner
            .checkpoints
            .advance(&mut checkpoint, Stage::SecondaryDistributed)
            .await?;
        inner.set_stage(checkpoint.stage);
    }

    // Lap loop
    let mut lap_number: u64 = 0;
    while !token.is_stopped() {
        if let Some(max) = inner.config.max_laps {
            if lap_number >= max {
                tracing::info!(session = %session_ref, laps = lap_number, "Lap limit reached");
                break;
            }
        }
        // Let control calls land between laps even when phases never block
        tokio::task::yield_now().await;
        token.wait_if_paused().await;
        if token.is_stopped() {
            break;
        }

        lap_number += 1;
        inner.lock().current_lap = lap_number;

        let record = inner
            .orchestrator
            .run_lap(lap_number, &mut checkpoint.pool, &admin, token)
            .await;

        let failed = record.status != LapStatus::Completed;
        let reason = record.error_message.clone();
        {
            let mut shared = inner.lock();
            shared.summary.record(&record);
            shared.history.push(record);
        }
        // Persist the rotated pool so a crash resumes with live credentials
        inner.checkpoints.save(&mut checkpoint).await?;

        // A failed lap halts the session and clears the run flag; the pool
        // stays as the checkpoint recorded it, unswept, for the operator
        if failed {
            return Err(RotorError::Fatal(
                reason.unwrap_or_else(|| "lap failed".to_string()),
            ));
        }
    }

    close_out(inner, &mut checkpoint, &admin, session_ref).await
}

async fn load_or_create<L, M, S>(
    inner: &Arc<EngineInner<L, M, S>>,
    session_ref: &str,
) -> Result<SessionCheckpoint>
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    match inner.checkpoints.resume(session_ref).await {
        Ok(checkpoint) => Ok(checkpoint),
        Err(RotorError::SessionNotFound(_)) => {
            // Stage 1: resolve the pair and create the session document
            let pair = guard_with_retry(
                || inner.market.resolve_pair(&inner.config.resource_name),
                inner.config.collection_bound(),
                "bootstrap:pair",
                &inner.config.retry_policy(),
            )
            .await?;
            let checkpoint =
                SessionCheckpoint::new(session_ref, inner.config.resource_name.clone(), pair);
            inner.checkpoints.create(&checkpoint).await?;
            Ok(checkpoint)
        }
        Err(err) => Err(err),
    }
}

/// Stage 6: sweep every worker back to the admin and close the pool.
async fn close_out<L, M, S>(
    inner: &Arc<EngineInner<L, M, S>>,
    checkpoint: &mut SessionCheckpoint,
    admin: &WorkerIdentity,
    session_ref: &str,
) -> Result<()>
where
    L: LedgerClient + 'static,
    M: MarketDataProvider + 'static,
    S: SessionStore + 'static,
{
    if !checkpoint.pool.is_empty() {
        let swept = inner.orchestrator.sweep(&mut checkpoint.pool, admin).await;
        tracing::info!(
            session = %session_ref,
            primary = swept.total_primary_collected,
            secondary = swept.total_secondary_collected,
            failed = swept.failed_count(),
            "Final sweep finished"
        );
        for worker in checkpoint.pool.iter_mut() {
            worker.retire();
        }
        checkpoint.pool.clear();
    }
    inner
        .checkpoints
        .advance(checkpoint, Stage::AccountsSwept)
        .await?;
    inner.set_stage(checkpoint.stage);
    tracing::info!(session = %session_ref, "Session closed");
    Ok(())
}
