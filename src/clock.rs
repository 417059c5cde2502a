//! Wall clock anchored to the tokio clock.
//!
//! Poll times are stored as `DateTime<Utc>` (they travel in `data_update` and
//! are compared against remote `last_seen_at`), but every wait runs on tokio
//! timers. [`Clock`] samples the wall clock once and advances it by tokio's
//! monotonic elapsed time, so paused-time tests see consistent wall times.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Stand-in for "never" when a wall time can't be represented as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Wall clock driven by `tokio::time::Instant`.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Clock {
    /// Anchors a clock at the current wall time.
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Anchors a clock at `wall` (tests use fixed instants).
    pub fn anchored_at(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            mono: Instant::now(),
        }
    }

    /// Current wall time.
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = self.mono.elapsed();
        self.wall + chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero())
    }

    /// Tokio instant corresponding to wall time `at` (clamped to the anchor).
    pub fn instant_at(&self, at: DateTime<Utc>) -> Instant {
        let offset = (at - self.wall).to_std().unwrap_or(Duration::ZERO);
        self.mono.checked_add(offset).unwrap_or_else(|| self.mono + FAR_FUTURE)
    }

    /// Wall time `delay` from now.
    pub fn after(&self, delay: Duration) -> DateTime<Utc> {
        let now = self.now();
        chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test(start_paused = true)]
    async fn test_wall_time_follows_tokio_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Clock::anchored_at(t0);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), t0 + chrono::Duration::seconds(90));

        let due = clock.after(Duration::from_secs(10));
        assert_eq!(clock.instant_at(due), Instant::now() + Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_wall_time_maps_to_anchor() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Clock::anchored_at(t0);
        let start = Instant::now();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(clock.instant_at(t0 - chrono::Duration::hours(1)), start);
    }
}
