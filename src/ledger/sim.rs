//! In-process simulated ledger
//!
//! Tracks balances per address in memory and supports scripted failures so
//! partial-failure paths are deterministic in tests. Also serves as the
//! backend for paper sessions in the CLI.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{ResourceKind, WorkerIdentity};
use crate::error::{Result, RotorError};
use crate::id::{generate_credential, generate_signature};

use super::{LedgerClient, TransferReceipt};

#[derive(Debug, Default)]
struct Balances {
    primary: f64,
    secondary: f64,
}

#[derive(Debug, Default)]
struct SimState {
    accounts: HashMap<String, Balances>,
    fail_transfers_from: HashSet<String>,
    fail_transfers_to: HashSet<String>,
}

/// Simulated ledger with in-memory accounts and scripted failures.
#[derive(Debug, Default)]
pub struct SimLedger {
    state: Mutex<SimState>,
    next_seq: AtomicU32,
    creates_done: AtomicUsize,
    create_budget: Mutex<Option<usize>>,
}

impl SimLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an existing account (or open one) with funds.
    pub fn credit(&self, address: &str, primary: f64, secondary: f64) {
        let mut state = lock(&self.state);
        let entry = state.accounts.entry(address.to_string()).or_default();
        entry.primary += primary;
        entry.secondary += secondary;
    }

    /// Read balances directly, for assertions.
    pub fn balance_of(&self, address: &str) -> (f64, f64) {
        let state = lock(&self.state);
        state
            .accounts
            .get(address)
            .map(|b| (b.primary, b.secondary))
            .unwrap_or((0.0, 0.0))
    }

    /// Script a network failure for any transfer out of `address`.
    pub fn fail_transfers_from(&self, address: &str) {
        lock(&self.state)
            .fail_transfers_from
            .insert(address.to_string());
    }

    /// Script a network failure for any transfer into `address`.
    pub fn fail_transfers_to(&self, address: &str) {
        lock(&self.state)
            .fail_transfers_to
            .insert(address.to_string());
    }

    /// Limit the total number of identity creations; further calls fail
    /// with a network error. `0` denies all creations.
    pub fn set_create_budget(&self, budget: usize) {
        *lock(&self.create_budget) = Some(budget);
    }

    /// Number of identities created so far.
    pub fn creates_done(&self) -> usize {
        self.creates_done.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl LedgerClient for SimLedger {
    async fn create_identity(&self) -> Result<WorkerIdentity> {
        if let Some(budget) = *lock(&self.create_budget) {
            if self.creates_done.load(Ordering::SeqCst) >= budget {
                return Err(RotorError::Network(
                    "identity creation rejected: budget exhausted".to_string(),
                ));
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.creates_done.fetch_add(1, Ordering::SeqCst);

        let address = format!("sim-{:04}", seq);
        // Keep any balance credited ahead of creation
        lock(&self.state)
            .accounts
            .entry(address.clone())
            .or_default();

        Ok(WorkerIdentity::new(0, generate_credential(), address))
    }

    async fn get_balance(&self, identity: &WorkerIdentity) -> Result<(f64, f64)> {
        let state = lock(&self.state);
        state
            .accounts
            .get(&identity.address)
            .map(|b| (b.primary, b.secondary))
            .ok_or_else(|| RotorError::Network(format!("unknown account: {}", identity.address)))
    }

    async fn transfer(
        &self,
        from: &WorkerIdentity,
        to: &WorkerIdentity,
        amount: f64,
        kind: ResourceKind,
    ) -> Result<TransferReceipt> {
        if amount <= 0.0 {
            return Err(RotorError::Validation(format!(
                "transfer amount must be positive, got {}",
                amount
            )));
        }

        let mut state = lock(&self.state);
        if state.fail_transfers_from.contains(&from.address) {
            return Err(RotorError::Network(format!(
                "transfer from {} rejected",
                from.address
            )));
        }
        if state.fail_transfers_to.contains(&to.address) {
            return Err(RotorError::Network(format!(
                "transfer to {} rejected",
                to.address
            )));
        }

        let source = state
            .accounts
            .get_mut(&from.address)
            .ok_or_else(|| RotorError::Network(format!("unknown account: {}", from.address)))?;

        let available = match kind {
            ResourceKind::Primary => source.primary,
            ResourceKind::Secondary => source.secondary,
        };
        // Small epsilon so sweeping a just-read balance never fails on fp dust
        if available + 1e-12 < amount {
            return Err(RotorError::Network(format!(
                "insufficient {} funds in {}: {} < {}",
                kind.as_str(),
                from.address,
                available,
                amount
            )));
        }
        match kind {
            ResourceKind::Primary => source.primary -= amount,
            ResourceKind::Secondary => source.secondary -= amount,
        }

        let dest = state.accounts.entry(to.address.clone()).or_default();
        match kind {
            ResourceKind::Primary => dest.primary += amount,
            ResourceKind::Secondary => dest.secondary += amount,
        }

        Ok(TransferReceipt {
            signature: generate_signature(),
            amount,
            kind,
        })
    }
}
