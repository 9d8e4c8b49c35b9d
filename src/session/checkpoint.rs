//! Checkpoint manager
//!
//! Enforces the stage progression rules over a `SessionStore`: forward
//! advances are monotonic and persisted immediately; resuming validates
//! the stored data against the stage being re-entered; only an explicit
//! operator restart may move the stage backward.

use std::sync::Arc;

use crate::domain::{SessionCheckpoint, Stage, WorkerIdentity};
use crate::error::{Result, RotorError};
use crate::session::store::SessionStore;

/// Stage progression over a session store.
pub struct CheckpointManager<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> CheckpointManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a brand-new stage-1 checkpoint.
    pub async fn create(&self, checkpoint: &SessionCheckpoint) -> Result<()> {
        self.store.save(checkpoint).await?;
        tracing::info!(
            session = %checkpoint.session_ref,
            stage = %checkpoint.stage,
            "Session checkpoint created"
        );
        Ok(())
    }

    /// Mark `stage` completed and persist. Forward progress only: moving
    /// to the current stage or an earlier one is rejected.
    pub async fn advance(&self, checkpoint: &mut SessionCheckpoint, stage: Stage) -> Result<()> {
        if stage <= checkpoint.stage {
            return Err(RotorError::InvalidState(format!(
                "cannot advance session {} from stage {} to stage {}",
                checkpoint.session_ref, checkpoint.stage, stage
            )));
        }
        checkpoint.stage = stage;
        checkpoint.touch();
        self.store.save(checkpoint).await?;
        tracing::info!(
            session = %checkpoint.session_ref,
            stage = %stage,
            "Stage completed"
        );
        Ok(())
    }

    /// Persist data changes (pool rotation, balances) without a stage move.
    pub async fn save(&self, checkpoint: &mut SessionCheckpoint) -> Result<()> {
        checkpoint.touch();
        self.store.save(checkpoint).await
    }

    /// Append newly minted workers to the stored pool.
    pub async fn append_workers(
        &self,
        pool: &[WorkerIdentity],
        session_ref: &str,
    ) -> Result<()> {
        self.store.append_workers(pool, session_ref).await
    }

    /// Load a checkpoint for resumption, validating that it carries the
    /// data its recorded stage implies.
    pub async fn resume(&self, session_ref: &str) -> Result<SessionCheckpoint> {
        let checkpoint = self.store.load(session_ref).await?;
        checkpoint.validate_for(checkpoint.stage)?;
        tracing::info!(
            session = %session_ref,
            stage = %checkpoint.stage,
            "Resuming from checkpoint"
        );
        Ok(checkpoint)
    }

    /// Operator-issued restart: reset the stored stage to `stage`, which
    /// may be earlier than the recorded one. The checkpoint must still
    /// carry the data the target stage requires.
    pub async fn restart_from(&self, session_ref: &str, stage: Stage) -> Result<SessionCheckpoint> {
        let mut checkpoint = self.store.load(session_ref).await?;
        checkpoint.validate_for(stage)?;
        let previous = checkpoint.stage;
        checkpoint.stage = stage;
        checkpoint.touch();
        self.store.save(&checkpoint).await?;
        tracing::info!(
            session = %session_ref,
            from = %previous,
            to = %stage,
            "Session stage reset by operator"
        );
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PairInfo;
    use crate::session::store::JsonSessionStore;
    use tempfile::TempDir;

    fn pair() -> PairInfo {
        PairInfo {
            pair_address: "pair-demo".to_string(),
            base_symbol: "DEMO".to_string(),
            quote_symbol: "PRI".to_string(),
            price: 1.0,
            liquidity: 0.0,
        }
    }

    fn manager(dir: &TempDir) -> CheckpointManager<JsonSessionStore> {
        CheckpointManager::new(Arc::new(JsonSessionStore::new(dir.path()).unwrap()))
    }

    #[tokio::test]
    async fn test_advance_is_monotonic() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        let mut cp = SessionCheckpoint::new("sess-adv", "DEMO", pair());
        mgr.create(&cp).await.unwrap();

        cp.admin = Some(WorkerIdentity::new(0, "cred", "admin"));
        mgr.advance(&mut cp, Stage::AdminCreated).await.unwrap();
        assert_eq!(cp.stage, Stage::AdminCreated);

        // Same stage and backward moves are rejected
        let err = mgr.advance(&mut cp, Stage::AdminCreated).await.unwrap_err();
        assert!(matches!(err, RotorError::InvalidState(_)));
        let err = mgr
            .advance(&mut cp, Stage::PairDiscovered)
            .await
            .unwrap_err();
        assert!(matches!(err, RotorError::InvalidState(_)));
        assert_eq!(cp.stage, Stage::AdminCreated);
    }

    #[tokio::test]
    async fn test_advance_persists_stage() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        let mut cp = SessionCheckpoint::new("sess-persist", "DEMO", pair());
        cp.admin = Some(WorkerIdentity::new(0, "cred", "admin"));
        mgr.create(&cp).await.unwrap();
        mgr.advance(&mut cp, Stage::AdminCreated).await.unwrap();

        let loaded = mgr.resume("sess-persist").await.unwrap();
        assert_eq!(loaded.stage, Stage::AdminCreated);
    }

    #[tokio::test]
    async fn test_append_workers_extends_stored_pool() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        let mut cp = SessionCheckpoint::new("sess-app", "DEMO", pair());
        cp.admin = Some(WorkerIdentity::new(0, "cred", "admin"));
        cp.stage = Stage::AdminCreated;
        mgr.create(&cp).await.unwrap();

        mgr.append_workers(&[WorkerIdentity::new(0, "c0", "w-0")], "sess-app")
            .await
            .unwrap();
        mgr.append_workers(&[WorkerIdentity::new(1, "c1", "w-1")], "sess-app")
            .await
            .unwrap();

        let loaded = mgr.resume("sess-app").await.unwrap();
        assert_eq!(loaded.pool.len(), 2);
        assert_eq!(loaded.pool[1].address, "w-1");
    }

    #[tokio::test]
    async fn test_resume_rejects_inconsistent_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonSessionStore::new(dir.path()).unwrap());
        let mgr = CheckpointManager::new(store.clone());

        // Stage 3 recorded but no admin and no pool: corrupted document
        let mut cp = SessionCheckpoint::new("sess-bad", "DEMO", pair());
        cp.stage = Stage::PoolGenerated;
        store.save(&cp).await.unwrap();

        let err = mgr.resume("sess-bad").await.unwrap_err();
        assert!(matches!(err, RotorError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_restart_from_moves_backward() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        let mut cp = SessionCheckpoint::new("sess-back", "DEMO", pair());
        cp.admin = Some(WorkerIdentity::new(0, "cred", "admin"));
        cp.pool.push(WorkerIdentity::new(0, "c", "w-0"));
        cp.stage = Stage::SecondaryDistributed;
        mgr.create(&cp).await.unwrap();

        let reset = mgr
            .restart_from("sess-back", Stage::PoolGenerated)
            .await
            .unwrap();
        assert_eq!(reset.stage, Stage::PoolGenerated);

        let loaded = mgr.resume("sess-back").await.unwrap();
        assert_eq!(loaded.stage, Stage::PoolGenerated);
    }

    #[tokio::test]
    async fn test_restart_from_validates_target_stage() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);
        // No admin: restarting from stage 3 is impossible
        let cp = SessionCheckpoint::new("sess-noadmin", "DEMO", pair());
        mgr.create(&cp).await.unwrap();

        let err = mgr
            .restart_from("sess-noadmin", Stage::PoolGenerated)
            .await
            .unwrap_err();
        assert!(matches!(err, RotorError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_restart_unknown_session() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        let err = mgr
            .restart_from("sess-ghost", Stage::PairDiscovered)
            .await
            .unwrap_err();
        assert!(matches!(err, RotorError::SessionNotFound(_)));
    }
}
