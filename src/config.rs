//! # Per-context runtime configuration.
//!
//! Provides [`Config`], the knobs shared by the election, the scheduler and
//! the delivery queue of one context.
//!
//! Config is used in two ways:
//! 1. **Context creation**: `ContextBuilder::new(bus, fetcher).with_config(config)`
//! 2. **Bus creation**: `Bus::new(config.bus_capacity_clamped())`
//!
//! ## Sentinel values
//! - `fetch_timeout = 0s` → no timeout around remote fetches
//! - `max_targets = 0` → no bound on the monitored set
//! - `notify_stagger = 0s` → survivors are delivered back to back

use std::time::Duration;

use crate::policies::{ActivityBackoff, JitterPolicy};

/// Lower bound for [`Config::tick`]; `tokio::time::interval` panics on zero.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Runtime configuration of one execution context.
///
/// ## Field semantics
/// - `tick`: scheduler period while leading
/// - `base_interval`: poll interval of an active target (multiplier 1×)
/// - `election_window`: how long to wait for `leader_here` before promoting
/// - `rejoin_delay` + `rejoin_jitter`: wait after `leader_resign` before re-electing
/// - `poll_jitter`: added on top of every rescheduled poll time
///
/// ## Notes
/// All fields are public. Prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Scheduler tick period. Each tick polls at most one due target.
    /// Read through [`Config::tick`], which clamps it to at least 1 ms.
    pub tick: Duration,

    /// Base poll interval, scaled by the activity backoff multiplier.
    pub base_interval: Duration,

    /// Election window: no `leader_here` within it means promote.
    pub election_window: Duration,

    /// Ceiling of the random wait after `leader_resign`.
    pub rejoin_delay: Duration,

    /// How `rejoin_delay` is randomised (default: full jitter, `0..=rejoin_delay`).
    pub rejoin_jitter: JitterPolicy,

    /// Jitter added to every computed next poll time.
    pub poll_jitter: JitterPolicy,

    /// Soft receive timeout of one remote fetch (`0s` = none).
    pub fetch_timeout: Duration,

    /// Upper bound on monitored targets (`0` = unbounded).
    pub max_targets: usize,

    /// Capacity of the recently-seen dedup cache.
    pub recently_seen_capacity: usize,

    /// Delay between two consecutive notifications of one pass.
    pub notify_stagger: Duration,

    /// Ring buffer size of the shared bus (min 1; clamped by Bus).
    pub bus_capacity: usize,

    /// Queue size for presenters that don't pick their own.
    pub presenter_queue: usize,

    /// Activity-derived multiplier table.
    pub backoff: ActivityBackoff,
}

impl Config {
    /// Returns the fetch timeout as an `Option`.
    #[inline]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout.is_zero() {
            None
        } else {
            Some(self.fetch_timeout)
        }
    }

    /// Returns the monitored-set bound as an `Option`.
    #[inline]
    pub fn target_limit(&self) -> Option<usize> {
        if self.max_targets == 0 {
            None
        } else {
            Some(self.max_targets)
        }
    }

    /// Returns the tick period clamped to a minimum of 1 ms.
    #[inline]
    pub fn tick(&self) -> Duration {
        self.tick.max(MIN_TICK)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Random wait before re-electing after a resignation.
    pub fn rejoin_wait(&self) -> Duration {
        self.rejoin_jitter.apply(self.rejoin_delay)
    }

    /// Delay until the next poll of a target whose multiplier is `multiplier`.
    pub fn poll_delay(&self, multiplier: f64) -> Duration {
        let scaled = ActivityBackoff::scale(self.base_interval, multiplier);
        self.poll_jitter.apply(scaled)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tick = 1s`, `base_interval = 60s`
    /// - `election_window = 200ms`, `rejoin_delay = 300ms` (full jitter)
    /// - `poll_jitter = +0..10s`, `fetch_timeout = 15s`
    /// - `max_targets = 5`, `recently_seen_capacity = 200`
    /// - `notify_stagger = 1s`, `bus_capacity = 256`, `presenter_queue = 1024`
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            base_interval: Duration::from_secs(60),
            election_window: Duration::from_millis(200),
            rejoin_delay: Duration::from_millis(300),
            rejoin_jitter: JitterPolicy::Full,
            poll_jitter: JitterPolicy::Additive(Duration::from_secs(10)),
            fetch_timeout: Duration::from_secs(15),
            max_targets: 5,
            recently_seen_capacity: 200,
            notify_stagger: Duration::from_secs(1),
            bus_capacity: 256,
            presenter_queue: 1024,
            backoff: ActivityBackoff::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let mut cfg = Config::default();
        assert_eq!(cfg.fetch_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.target_limit(), Some(5));

        cfg.fetch_timeout = Duration::ZERO;
        cfg.max_targets = 0;
        cfg.bus_capacity = 0;
        assert_eq!(cfg.fetch_timeout(), None);
        assert_eq!(cfg.target_limit(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let mut cfg = Config::default();
        assert_eq!(cfg.tick(), Duration::from_secs(1));
        cfg.tick = Duration::ZERO;
        assert_eq!(cfg.tick(), Duration::from_millis(1));
    }

    #[test]
    fn test_poll_delay_stays_within_jitter_bounds() {
        let cfg = Config::default();
        for _ in 0..50 {
            let d = cfg.poll_delay(1.5);
            assert!(d >= Duration::from_secs(90));
            assert!(d <= Duration::from_secs(100));
        }
    }

    #[test]
    fn test_rejoin_wait_is_bounded() {
        let cfg = Config::default();
        for _ in 0..50 {
            assert!(cfg.rejoin_wait() <= Duration::from_millis(300));
        }
    }
}
