//! Session checkpoint and the six-stage progression
//!
//! A checkpoint records which session stage has completed plus the minimal
//! data needed to resume from it. The stage is monotonically non-decreasing
//! during forward progress; only an operator-issued restart may move it
//! backward (see `CheckpointManager::restart_from`).

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotorError};
use crate::id::now_ms;
use crate::market::PairInfo;

use super::worker::WorkerIdentity;

/// The six durable markers of session progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pair discovered, session record created with placeholder identity
    PairDiscovered = 1,
    /// Admin identity created/imported and session updated
    AdminCreated = 2,
    /// Worker pool generated and appended
    PoolGenerated = 3,
    /// Primary resource distributed to the pool
    PrimaryDistributed = 4,
    /// Secondary resource distributed (skippable when the admin holds none)
    SecondaryDistributed = 5,
    /// All worker accounts swept and closed, balances returned to the admin
    AccountsSwept = 6,
}

impl Stage {
    /// Stage number in 1..=6.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Parse an operator-supplied stage number.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Stage::PairDiscovered),
            2 => Ok(Stage::AdminCreated),
            3 => Ok(Stage::PoolGenerated),
            4 => Ok(Stage::PrimaryDistributed),
            5 => Ok(Stage::SecondaryDistributed),
            6 => Ok(Stage::AccountsSwept),
            n => Err(RotorError::Validation(format!(
                "stage must be in 1..=6, got {}",
                n
            ))),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Durable session state, one document per session reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Session reference this checkpoint belongs to
    pub session_ref: String,
    /// Last completed stage
    pub stage: Stage,
    /// Admin identity holding swept balances; None until stage 2
    pub admin: Option<WorkerIdentity>,
    /// Current worker pool; empty until stage 3
    pub pool: Vec<WorkerIdentity>,
    /// Resolved tradeable pair; None until stage 1 completes
    pub pair: Option<PairInfo>,
    /// Resource the session trades
    pub resource_name: String,
    /// Creation timestamp (ms)
    pub created_at: i64,
    /// Last persisted update (ms)
    pub updated_at: i64,
}

impl SessionCheckpoint {
    /// Create a stage-1 checkpoint: pair discovered, placeholder admin.
    pub fn new(session_ref: impl Into<String>, resource_name: impl Into<String>, pair: PairInfo) -> Self {
        let now = now_ms();
        Self {
            session_ref: session_ref.into(),
            stage: Stage::PairDiscovered,
            admin: None,
            pool: Vec::new(),
            pair: Some(pair),
            resource_name: resource_name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Validate that this checkpoint carries the data a completed `stage`
    /// implies, so execution can re-enter at the following stage.
    ///
    /// Resuming past stage 1 needs the pair; past stage 2 the admin identity;
    /// past stage 3 a non-empty pool. The pair-discovery inputs are not
    /// needed to resume at stage 4 and later.
    pub fn validate_for(&self, stage: Stage) -> Result<()> {
        if self.pair.is_none() {
            return Err(RotorError::InvalidState(format!(
                "checkpoint {} has no pair info",
                self.session_ref
            )));
        }
        if stage >= Stage::AdminCreated && self.admin.is_none() {
            return Err(RotorError::InvalidState(format!(
                "checkpoint {} has no admin identity, cannot resume from stage {}",
                self.session_ref, stage
            )));
        }
        if stage >= Stage::PoolGenerated && stage < Stage::AccountsSwept && self.pool.is_empty() {
            return Err(RotorError::InvalidState(format!(
                "checkpoint {} has an empty worker pool, cannot resume from stage {}",
                self.session_ref, stage
            )));
        }
        Ok(())
    }
}
