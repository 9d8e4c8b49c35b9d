//! Lap phase executors
//!
//! Each phase processes the pool sequentially in index order, pacing items
//! through the throttle and bounding every remote call with the guard.
//! Per-worker failures are recorded locally and never abort a phase; a
//! phase only fails as a whole when it cannot produce a usable result.

pub mod collection;
pub mod distribution;
pub mod regen;

pub use collection::CollectionExecutor;
pub use distribution::DistributionEngine;
pub use regen::PoolRegenerator;
