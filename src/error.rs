//! Error types for rotor
//!
//! Centralized error handling using thiserror.
//!
//! Per-worker failures inside a phase are never represented as error values:
//! they are recovered locally into the phase's records (see
//! `CollectionRecord` / `DistributionRecord`). Only errors that make a phase
//! unusable cross the phase boundary, and only `Fatal` terminates a session.

use thiserror::Error;

/// All error types that can occur in rotor
#[derive(Debug, Error)]
pub enum RotorError {
    /// Input rejected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A guarded operation exceeded its deadline
    #[error("Operation '{label}' timed out after {bound_ms}ms")]
    Timeout {
        /// Label supplied to the guard, for diagnostics
        label: String,
        /// The deadline that was exceeded, in milliseconds
        bound_ms: u64,
    },

    /// Transient failure from the external ledger network
    #[error("Network error: {0}")]
    Network(String),

    /// A phase cannot produce a usable result; aborts the current lap
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Session store / persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session checkpoint not found in the store
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Tradeable pair could not be resolved
    #[error("Pair not found: {0}")]
    PairNotFound(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RotorError {
    /// Returns true if the error is worth retrying (see `guard_with_retry`).
    pub fn is_transient(&self) -> bool {
        matches!(self, RotorError::Timeout { .. } | RotorError::Network(_))
    }

    /// Returns true if the error must terminate the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RotorError::Fatal(_))
    }
}

/// Result type alias for rotor operations
pub type Result<T> = std::result::Result<T, RotorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = RotorError::Validation("pool size 0 outside [1,100]".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: pool size 0 outside [1,100]"
        );
        assert!(!err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_timeout_error_carries_label_and_bound() {
        let err = RotorError::Timeout {
            label: "collect:balance".to_string(),
            bound_ms: 30_000,
        };
        assert_eq!(
            err.to_string(),
            "Operation 'collect:balance' timed out after 30000ms"
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_network_error_is_transient() {
        let err = RotorError::Network("connection reset".to_string());
        assert!(err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_error() {
        let err = RotorError::Fatal("Wallet regeneration failed".to_string());
        assert_eq!(err.to_string(), "Fatal: Wallet regeneration failed");
        assert!(err.is_fatal());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_storage_error() {
        let err = RotorError::Storage("file locked".to_string());
        assert_eq!(err.to_string(), "Storage error: file locked");
    }

    #[test]
    fn test_session_not_found() {
        let err = RotorError::SessionNotFound("sess-001".to_string());
        assert_eq!(err.to_string(), "Session not found: sess-001");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RotorError = io_err.into();
        assert!(matches!(err, RotorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RotorError = json_err.into();
        assert!(matches!(err, RotorError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(RotorError::InvalidState("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
