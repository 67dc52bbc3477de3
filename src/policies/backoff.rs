//! # Backoff policy for connection retries.
//!
//! [`BackoffPolicy`] computes the pause between failed attempts:
//! - [`BackoffPolicy::first`] the delay after the first failure;
//! - [`BackoffPolicy::factor`] the multiplicative growth per attempt;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The delay for attempt `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`, with jitter applied last. The base is derived purely from the
//! attempt number, so jitter output never feeds back into later attempts.
//!
//! The default profile is the database-connect schedule: 2s doubling to a
//! 10s cap with no jitter, which makes the pause sequence between five
//! attempts exactly 2000, 4000, 8000, 10000 ms.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use servisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//! assert_eq!(backoff.delay(0), Duration::from_millis(2000));
//! assert_eq!(backoff.delay(1), Duration::from_millis(4000));
//! assert_eq!(backoff.delay(2), Duration::from_millis(8000));
//! assert_eq!(backoff.delay(3), Duration::from_millis(10000));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
///
/// The schedule is deterministic unless a [`JitterPolicy`] other than
/// `None` is selected.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Cap applied to every computed delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to the clamped base.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// The database-connect profile:
    /// - `first = 2s`;
    /// - `factor = 2.0`;
    /// - `max = 10s`;
    /// - no jitter (the schedule must be deterministic).
    fn default() -> Self {
        Self {
            first: Duration::from_millis(2000),
            max: Duration::from_millis(10_000),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base is `first × factor^attempt`, clamped to [`BackoffPolicy::max`];
    /// overflow and non-finite intermediates clamp to the cap as well. Jitter
    /// is applied to the clamped base and never feeds back into later
    /// attempts.
    pub fn delay(&self, attempt: u32) -> Duration {
        let cap = self.max.as_secs_f64();
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let raw = self.first.as_secs_f64() * self.factor.powi(exponent);

        let base = if raw.is_finite() && (0.0..=cap).contains(&raw) {
            Duration::from_secs_f64(raw)
        } else {
            self.max
        };

        self.jitter.apply(base)
    }
}
