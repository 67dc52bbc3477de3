//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] optionally randomizes backoff delays so that a fleet of
//! instances retrying against the same endpoint does not stampede it.
//!
//! - [`JitterPolicy::None`] — keep the exact delay (the default; the
//!   connection establisher relies on a deterministic schedule)
//! - [`JitterPolicy::Full`] — random delay in `[0, base]`
//! - [`JitterPolicy::Equal`] — `base/2 + random[0, base/2]`

use rand::Rng;
use std::time::Duration;

/// Randomization applied to a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact delay. Required wherever timing must be
    /// reproducible, such as the connection retry schedule.
    #[default]
    None,

    /// Random delay in `[0, base]`. Maximum spread, can shrink the pause
    /// close to zero.
    Full,

    /// `base/2 + random[0, base/2]`. Keeps at least half the pause while
    /// still spreading load.
    Equal,
}

impl JitterPolicy {
    /// Applies this policy to the given base delay.
    pub fn apply(&self, base: Duration) -> Duration {
        match self {
            JitterPolicy::None => base,
            JitterPolicy::Full => full_jitter(base),
            JitterPolicy::Equal => equal_jitter(base),
        }
    }
}

fn full_jitter(base: Duration) -> Duration {
    let ms = base.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(0..=ms))
}

fn equal_jitter(base: Duration) -> Duration {
    let ms = base.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let mut rng = rand::thread_rng();
    let spread = if half == 0 { 0 } else { rng.gen_range(0..=half) };
    Duration::from_millis(half + spread)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let base = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(base), base);
    }

    #[test]
    fn test_full_bounds() {
        let base = Duration::from_millis(800);
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(base) <= base);
        }
    }

    #[test]
    fn test_equal_bounds() {
        let base = Duration::from_millis(800);
        for _ in 0..200 {
            let jittered = JitterPolicy::Equal.apply(base);
            assert!(jittered >= Duration::from_millis(400));
            assert!(jittered <= base);
        }
    }

    #[test]
    fn test_zero_base_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
