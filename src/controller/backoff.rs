//! # Exponential Backoff
//!
//! Requeue hint for failed passes: `base * 2^failures`, capped.
//!
//! The hint is handed to the scheduler; nothing here sleeps or retries.
//!
//! ## Usage
//!
//! ```rust
//! use passbolt_secret_controller::controller::backoff::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
//! assert_eq!(backoff.delay(0), Duration::from_secs(5));
//! assert_eq!(backoff.delay(1), Duration::from_secs(10));
//! assert_eq!(backoff.delay(2), Duration::from_secs(20));
//! assert_eq!(backoff.delay(10), Duration::from_secs(300));
//! ```

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Build from `BACKOFF_BASE_SECS` / `BACKOFF_MAX_SECS`
    #[must_use]
    pub fn from_config(config: &crate::config::ControllerConfig) -> Self {
        Self::new(
            Duration::from_secs(config.backoff_base_secs),
            Duration::from_secs(config.backoff_max_secs),
        )
    }

    /// Delay before the next pass after `failures` consecutive failed passes
    #[must_use]
    pub fn delay(&self, failures: u32) -> Duration {
        // saturates at the cap
        let factor = 1_u32.checked_shl(failures.min(31)).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
