//! rotor: lap orchestration over rotating pools of ephemeral worker identities
//!
//! A session bootstraps through six checkpointed stages (pair discovery,
//! admin identity, pool generation, primary and secondary distribution,
//! final sweep), then loops laps: trade, collect, regenerate, distribute,
//! validate. Every external call is bounded by the timeout guard, every
//! phase tolerates per-worker failure, and the checkpoint makes a crashed
//! or stopped session resumable from the last completed stage.

pub mod aggregate;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod guard;
pub mod id;
pub mod ledger;
pub mod market;
pub mod orchestrator;
pub mod phases;
pub mod session;
pub mod strategy;
pub mod throttle;

pub use error::{Result, RotorError};
