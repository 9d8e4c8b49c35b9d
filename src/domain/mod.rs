//! Domain types for rotor
//!
//! This module contains all core domain records:
//! - WorkerIdentity: an ephemeral credentialed actor holding resource balances
//! - LapRecord: one full rotation cycle, immutable once finalized
//! - CollectionRecord / CollectionOutcome: per-worker sweep results
//! - DistributionPlan / DistributionOutcome: per-recipient allocation results
//! - SessionCheckpoint / Stage: the six durable markers of session progress

pub mod checkpoint;
pub mod collection;
pub mod distribution;
pub mod lap;
pub mod worker;

pub use checkpoint::{SessionCheckpoint, Stage};
pub use collection::{CollectionOutcome, CollectionRecord, CollectionStatus};
pub use distribution::{
    ALLOCATION_EPSILON, DistributionOutcome, DistributionPlan, DistributionRecord, ResourceKind,
};
pub use lap::{LapPhase, LapRecord, LapStatus, PhaseTiming};
pub use worker::WorkerIdentity;
