//! Bounded exponential backoff for reconnecting to the relay.

use std::time::Duration;

/// Reconnection policy.
///
/// The delay after the `n`-th consecutive failure is `min(base_delay * 2^(n-1), max_delay)`.
/// `max_attempts` counts connection attempts, so the session gives up on the
/// `max_attempts`-th failure without scheduling another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait after the `failures`-th consecutive failure, or `None`
    /// once the budget is exhausted.
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        if failures == 0 || failures >= self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}
