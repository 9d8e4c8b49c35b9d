//! Worker identity record
//!
//! A WorkerIdentity is an ephemeral credentialed actor that holds primary and
//! secondary resource balances for one lap. The credential is opaque secret
//! material: it is persisted for resumption but must never appear in logs,
//! which is why Debug is implemented by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::now_ms;

/// An ephemeral worker identity, rotated every lap
#[derive(Clone, Serialize, Deserialize)]
pub struct WorkerIdentity {
    /// Pool-local sequence number, assigned by the regenerator
    pub id: u32,
    /// Opaque secret material. Never logged; discarded on retirement.
    pub credential: String,
    /// Public identifier on the ledger
    pub address: String,
    /// Primary resource balance as last observed/mutated by a phase
    pub primary_balance: f64,
    /// Secondary resource balance
    pub secondary_balance: f64,
    /// True only after the worker has received nonzero primary resource
    pub active: bool,
    /// Creation timestamp (ms since epoch)
    pub created_at: i64,
}

impl WorkerIdentity {
    /// Create a new identity with zero balances.
    pub fn new(id: u32, credential: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            credential: credential.into(),
            address: address.into(),
            primary_balance: 0.0,
            secondary_balance: 0.0,
            active: false,
            created_at: now_ms(),
        }
    }

    /// Retire the identity: discard the credential and deactivate.
    ///
    /// Credentials are never reused; a retired identity cannot sign again.
    pub fn retire(&mut self) {
        self.credential.clear();
        self.active = false;
    }

    /// Returns true if the identity has been retired.
    pub fn is_retired(&self) -> bool {
        self.credential.is_empty()
    }
}

impl fmt::Debug for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerIdentity")
            .field("id", &self.id)
            .field("credential", &"<redacted>")
            .field("address", &self.address)
            .field("primary_balance", &self.primary_balance)
            .field("secondary_balance", &self.secondary_balance)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish()
    }
}
