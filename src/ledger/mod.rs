//! Ledger client seam
//!
//! All value-transfer operations go through the `LedgerClient` trait. One
//! implementation is chosen at startup and injected; the orchestrator never
//! branches on backend capabilities. `SimLedger` is an in-process
//! implementation satisfying the same contract, used for paper sessions and
//! tests so the orchestrator's logic is exercised identically in both.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ResourceKind, WorkerIdentity};
use crate::error::Result;

pub use sim::SimLedger;

/// Acknowledgment of an executed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Backend transaction signature
    pub signature: String,
    /// Amount moved
    pub amount: f64,
    /// Resource moved
    pub kind: ResourceKind,
}

/// External value-transfer network operations
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Mint a new credentialed identity with zero balances.
    ///
    /// The returned identity carries the backend credential and address;
    /// the pool-local `id` is assigned by the regenerator.
    async fn create_identity(&self) -> Result<WorkerIdentity>;

    /// Read `(primary, secondary)` balances for an identity.
    async fn get_balance(&self, identity: &WorkerIdentity) -> Result<(f64, f64)>;

    /// Transfer `amount` of the given resource between identities.
    async fn transfer(
        &self,
        from: &WorkerIdentity,
        to: &WorkerIdentity,
        amount: f64,
        kind: ResourceKind,
    ) -> Result<TransferReceipt>;
}
