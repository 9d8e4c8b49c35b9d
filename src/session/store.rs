//! Session store trait and JSON file implementation
//!
//! One JSON document per session reference under a base directory. The
//! document is small (admin identity, pool, pair, stage) and rewritten
//! whole on every save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{SessionCheckpoint, WorkerIdentity};
use crate::error::{Result, RotorError};

/// Durable persistence of session checkpoints.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the checkpoint for a session reference.
    async fn load(&self, session_ref: &str) -> Result<SessionCheckpoint>;

    /// Persist a checkpoint, replacing any previous document.
    async fn save(&self, checkpoint: &SessionCheckpoint) -> Result<()>;

    /// Append newly minted workers to the stored pool.
    async fn append_workers(&self, pool: &[WorkerIdentity], session_ref: &str) -> Result<()>;

    /// Delete a session document. Deleting a missing session is a success.
    async fn delete(&self, session_ref: &str) -> Result<()>;
}

/// File-backed store: `{base_dir}/{session_ref}.json`.
pub struct JsonSessionStore {
    base_dir: PathBuf,
}

impl JsonSessionStore {
    /// Create a store rooted at `base_dir`, creating the directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn session_path(&self, session_ref: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", session_ref))
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn load(&self, session_ref: &str) -> Result<SessionCheckpoint> {
        let path = self.session_path(session_ref);
        if !path.exists() {
            return Err(RotorError::SessionNotFound(session_ref.to_string()));
        }
        let raw = std::fs::read_to_string(&path)?;
        let checkpoint: SessionCheckpoint = serde_json::from_str(&raw)?;
        Ok(checkpoint)
    }

    async fn save(&self, checkpoint: &SessionCheckpoint) -> Result<()> {
        let path = self.session_path(&checkpoint.session_ref);
        let raw = serde_json::to_string_pretty(checkpoint)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    async fn append_workers(&self, pool: &[WorkerIdentity], session_ref: &str) -> Result<()> {
        let mut checkpoint = self.load(session_ref).await?;
        checkpoint.pool.extend_from_slice(pool);
        checkpoint.touch();
        self.save(&checkpoint).await
    }

    async fn delete(&self, session_ref: &str) -> Result<()> {
        let path = self.session_path(session_ref);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
