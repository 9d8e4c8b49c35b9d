//! Lap and session orchestration
//!
//! `LapOrchestrator` drives the per-lap state machine; `SessionEngine`
//! owns the background task, the six-stage bootstrap, and the operator
//! control surface.

pub mod lap;
pub mod session;

pub use lap::LapOrchestrator;
pub use session::SessionEngine;
