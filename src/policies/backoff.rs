//! # Activity-derived backoff for target polling.
//!
//! [`ActivityBackoff`] turns "how long ago was this account last seen" into a
//! multiplier on the scheduler's base interval. Quiet accounts are polled
//! less often; an account that was seen a minute ago is polled at the base
//! rate.
//!
//! The multiplier is a step function of minutes since `last_seen_at`:
//!
//! ```text
//!   minutes   <2   <10   <60   <120   else / unknown
//!   factor    1×   1.5×  4×    5×     20×
//! ```
//!
//! and the result is doubled while the overlay is collapsed (the tab is in
//! the background from the user's point of view).
//!
//! # Example
//! ```rust
//! use chrono::Duration;
//! use seekvisor::ActivityBackoff;
//!
//! let backoff = ActivityBackoff::default();
//! assert_eq!(backoff.multiplier(Some(Duration::minutes(1)), false), 1.0);
//! assert_eq!(backoff.multiplier(Some(Duration::minutes(30)), false), 4.0);
//! assert_eq!(backoff.multiplier(Some(Duration::minutes(30)), true), 8.0);
//! assert_eq!(backoff.multiplier(None, false), 20.0);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One step of the function: accounts seen less than `below_minutes` ago get `factor`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackoffStep {
    /// Exclusive upper bound in minutes since last seen.
    pub below_minutes: f64,
    /// Multiplier applied to the base interval.
    pub factor: f64,
}

/// Activity-derived backoff policy.
///
/// - [`ActivityBackoff::steps`]: ascending thresholds with their factors;
/// - [`ActivityBackoff::idle`]: factor once every threshold is exceeded (or last-seen is unknown);
/// - [`ActivityBackoff::collapsed`]: extra factor while the UI is collapsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityBackoff {
    /// Ascending steps; the first matching step wins.
    pub steps: Vec<BackoffStep>,
    /// Factor for accounts quieter than every step.
    pub idle: f64,
    /// Additional factor while collapsed.
    pub collapsed: f64,
}

impl Default for ActivityBackoff {
    /// Returns a policy with:
    /// - `<2m → 1×`, `<10m → 1.5×`, `<60m → 4×`, `<120m → 5×`;
    /// - `idle = 20×`;
    /// - `collapsed = 2×`.
    fn default() -> Self {
        Self {
            steps: vec![
                BackoffStep { below_minutes: 2.0, factor: 1.0 },
                BackoffStep { below_minutes: 10.0, factor: 1.5 },
                BackoffStep { below_minutes: 60.0, factor: 4.0 },
                BackoffStep { below_minutes: 120.0, factor: 5.0 },
            ],
            idle: 20.0,
            collapsed: 2.0,
        }
    }
}

impl ActivityBackoff {
    /// Computes the multiplier for an account last seen `since` ago.
    ///
    /// # Notes
    /// - `None` (never seen / field missing) is treated as idle.
    /// - A negative `since` (clock skew, last-seen in the future) counts as "just now".
    pub fn multiplier(&self, since: Option<chrono::Duration>, collapsed: bool) -> f64 {
        let base = match since {
            None => self.idle,
            Some(since) => {
                let minutes = since.num_milliseconds().max(0) as f64 / 60_000.0;
                self.steps
                    .iter()
                    .find(|step| minutes < step.below_minutes)
                    .map_or(self.idle, |step| step.factor)
            }
        };
        if collapsed { base * self.collapsed } else { base }
    }

    /// Scales `base` by `multiplier`, guarding against non-finite or non-positive factors.
    pub fn scale(base: Duration, multiplier: f64) -> Duration {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return base;
        }
        Duration::try_from_secs_f64(base.as_secs_f64() * multiplier).unwrap_or(Duration::MAX)
    }
}
