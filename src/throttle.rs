//! Inter-item pacing for external rate limits
//!
//! Workers are processed sequentially with a deliberate delay between items
//! so the external ledger is never hammered. The delay is an explicit,
//! configurable pacer rather than a hardcoded sleep constant, so throughput
//! and test speed are both controllable.

use std::time::Duration;

use tokio::time::Instant;

/// Paces a sequential loop so consecutive permits are at least
/// `min_interval` apart. The first permit is immediate.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_permit: Option<Instant>,
}

impl Throttle {
    /// Create a pacer with the given minimum interval between items.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_permit: None,
        }
    }

    /// A pacer that never waits, for tests and dry runs.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the next permit is due, then take it.
    pub async fn pace(&mut self) {
        if self.min_interval.is_zero() {
            return;
        }
        if let Some(last) = self.last_permit {
            let due = last + self.min_interval;
            let now = Instant::now();
            if now < due {
                tokio::time::sleep_until(due).await;
            }
        }
        self.last_permit = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_throttle_never_waits() {
        let mut throttle = Throttle::disabled();
        let start = Instant::now();
        for _ in 0..100 {
            throttle.pace().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let mut throttle = Throttle::new(Duration::from_secs(10));
        let start = Instant::now();
        throttle.pace().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaces_consecutive_permits() {
        let mut throttle = Throttle::new(Duration::from_millis(500));
        let start = Instant::now();

        throttle.pace().await;
        throttle.pace().await;
        throttle.pace().await;

        // Two waits of 500ms each under the paused clock
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_interval_already_elapsed() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.pace().await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        let before = Instant::now();
        throttle.pace().await;
        assert_eq!(Instant::now(), before);
    }
}
