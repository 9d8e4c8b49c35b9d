//! Session persistence: checkpoint manager and session store
//!
//! The store persists one checkpoint document per session reference; the
//! manager layers the stage progression rules on top of it (monotonic
//! advance, validated resume, operator-only backward restart).

pub mod checkpoint;
pub mod store;

pub use checkpoint::CheckpointManager;
pub use store::{JsonSessionStore, SessionStore};
