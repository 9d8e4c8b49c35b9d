//! ID generation utilities for rotor
//!
//! Provides functions for generating session references, credentials, and
//! transfer signatures.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique session reference
///
/// Format: `sess-{timestamp_ms}-{random_hex}`
/// Example: `sess-1738300800123-a1b2`
pub fn generate_session_ref() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("sess-{}-{:04x}", timestamp, random)
}

/// Generate an opaque credential string for a simulated identity
///
/// Real ledger backends return their own secret material; this is only used
/// by the in-process ledger.
pub fn generate_credential() -> String {
    let hi: u64 = rand::rng().random();
    let lo: u64 = rand::rng().random();
    format!("{:016x}{:016x}", hi, lo)
}

/// Generate a transfer receipt signature
///
/// Format: `tx-{timestamp_ms}-{random_hex}`
pub fn generate_signature() -> String {
    let timestamp = now_ms();
    let random: u32 = rand::rng().random();
    format!("tx-{}-{:08x}", timestamp, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        // Should be after 2020-01-01 and before 2100-01-01
        assert!(ts > 1577836800000);
        assert!(ts < 4102444800000);
    }

    #[test]
    fn test_generate_session_ref_format() {
        let id = generate_session_ref();
        assert!(id.starts_with("sess-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_session_ref_uniqueness() {
        let id1 = generate_session_ref();
        let id2 = generate_session_ref();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_credential_length() {
        let cred = generate_credential();
        assert_eq!(cred.len(), 32);
        assert!(cred.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_signature_format() {
        let sig = generate_signature();
        assert!(sig.starts_with("tx-"));
        let parts: Vec<&str> = sig.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 8);
    }
}
