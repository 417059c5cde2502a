//! # Jitter policy for poll schedules and re-election delays.
//!
//! [`JitterPolicy`] adds randomness to delays so that independent contexts do
//! not act in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Full`]: random delay in [0, delay] (used for the re-election pause)
//! - [`JitterPolicy::Additive`]: delay + random[0, max] (used for poll rescheduling)

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of delays.
///
/// ## Trade-offs
/// - **None**: Predictable, but contexts may act simultaneously (tests use it)
/// - **Full**: Maximum spreading of an otherwise identical delay
/// - **Additive**: Keeps the base delay as a floor and spreads above it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use the exact delay.
    #[default]
    None,

    /// Full jitter: random delay in [0, delay].
    ///
    /// After a leader resigns every follower waits `Full.apply(rejoin_delay)`
    /// before re-electing, avoiding a thundering herd of `leader_check`s.
    Full,

    /// Additive jitter: delay + random[0, max].
    ///
    /// The scheduler uses it to spread polls of targets with equal cycles.
    Additive(Duration),
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => self.full_jitter(delay),
            JitterPolicy::Additive(max) => delay.saturating_add(self.upto(*max)),
        }
    }

    /// Upper bound of the value returned by [`apply`](Self::apply) for `delay`.
    pub fn ceiling(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Full => delay,
            JitterPolicy::Additive(max) => delay.saturating_add(*max),
        }
    }

    /// Full jitter: random[0, delay]
    fn full_jitter(&self, delay: Duration) -> Duration {
        self.upto(delay)
    }

    /// Uniform sample in [0, max] with millisecond resolution.
    fn upto(&self, max: Duration) -> Duration {
        let ms = max.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
        assert_eq!(JitterPolicy::None.ceiling(d), d);
    }

    #[test]
    fn test_full_jitter_bounds() {
        let d = Duration::from_millis(300);
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(d) <= d);
        }
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_additive_jitter_keeps_floor() {
        let policy = JitterPolicy::Additive(Duration::from_secs(10));
        let base = Duration::from_secs(60);
        for _ in 0..200 {
            let delay = policy.apply(base);
            assert!(delay >= base, "delay {delay:?} below base");
            assert!(delay <= policy.ceiling(base), "delay {delay:?} above ceiling");
        }
    }
}
