//! # Adaptive scheduler.
//!
//! Runs only in the leader. Every tick it picks the **first** due target in
//! list order and polls just that one; quiet targets are pushed further out
//! by an activity-derived multiplier.
//!
//! ```text
//! tick ──► next_due(targets, now) ──► plan(target) ──► runner ──► apply(report)
//!                                                                   │
//!   next_poll_at = now + base × multiplier + jitter  ◄──────────────┘
//! ```
//!
//! ## Poll modes
//! - [`PollMode::Incremental`] (tick, single refresh): diffs against the cursor
//!   and yields fresh actions to deliver.
//! - [`PollMode::Baseline`] (poll-all, admission): never yields fresh actions;
//!   sets the cursor only when the target has none.
//!
//! A failed fetch leaves the target untouched apart from its next poll time.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::diff;
use crate::config::Config;
use crate::error::FetchError;
use crate::model::{Action, ActionId, AggregateState, Profile, RecentlySeenSet, Target};
use crate::remote::{FetchOutcome, PollProbe};

/// How a poll's result is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Diff against the cursor and deliver survivors.
    Incremental,
    /// Establish a cursor only; never deliver.
    Baseline,
}

/// One planned fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPlan {
    /// Target id.
    pub target: String,
    /// What the context knew when planning.
    pub probe: PollProbe,
    /// How to interpret the result.
    pub mode: PollMode,
}

/// Result of executing a [`PollPlan`].
#[derive(Debug, Clone)]
pub struct PollReport {
    /// Target id.
    pub target: String,
    /// Mode from the plan.
    pub mode: PollMode,
    /// Fetch result.
    pub result: Result<FetchOutcome, FetchError>,
}

/// What [`Scheduler::apply`] did to one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// The target was removed while the fetch was in flight.
    pub gone: bool,
    /// The action list was skipped (profile unchanged).
    pub skipped: bool,
    /// The fetch failed with this error.
    pub failed: Option<FetchError>,
    /// Cursor after the poll, when it moved.
    pub cursor: Option<ActionId>,
    /// Actions to deliver, oldest first.
    pub fresh: Vec<Action>,
    /// Delay until the next poll.
    pub delay: Duration,
    /// Multiplier in effect for the next poll.
    pub multiplier: f64,
}

/// Per-leader scheduling logic. Holds no target state of its own.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: Config,
}

impl Scheduler {
    /// Scheduler using `config`'s intervals and backoff table.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Index of the first target due at `now`.
    pub fn next_due(&self, targets: &[Target], now: DateTime<Utc>) -> Option<usize> {
        targets.iter().position(|t| t.is_due(now))
    }

    /// Backoff multiplier for `profile` observed at `now`.
    pub fn multiplier(&self, profile: &Profile, now: DateTime<Utc>, collapsed: bool) -> f64 {
        let since = profile.last_seen_at.map(|seen| now - seen);
        self.config.backoff.multiplier(since, collapsed)
    }

    /// Pushes `target`'s next poll time out by its multiplier plus jitter.
    pub fn reschedule(&self, target: &mut Target, now: DateTime<Utc>) -> Duration {
        let delay = self.config.poll_delay(target.multiplier);
        let at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        target.next_poll_at = Some(at);
        delay
    }

    /// Plan for a tick or single-target refresh.
    pub fn plan(&self, state: &AggregateState, target: &Target, force: bool) -> PollPlan {
        PollPlan {
            target: target.id.clone(),
            probe: PollProbe {
                initial: force || target.profile.is_none(),
                previous: target.profile.clone(),
                has_actions: state.has_actions(&target.id),
            },
            mode: PollMode::Incremental,
        }
    }

    /// Baseline plan for one target (admission, poll-all).
    pub fn baseline(&self, target: &str) -> PollPlan {
        PollPlan {
            target: target.to_string(),
            probe: PollProbe {
                initial: true,
                previous: None,
                has_actions: false,
            },
            mode: PollMode::Baseline,
        }
    }

    /// Baseline plans for every target, in list order.
    pub fn cycle(&self, state: &AggregateState) -> Vec<PollPlan> {
        state.targets.iter().map(|t| self.baseline(&t.id)).collect()
    }

    /// Folds a poll report into `state`.
    pub fn apply(
        &self,
        state: &mut AggregateState,
        recent: &mut RecentlySeenSet,
        report: PollReport,
        now: DateTime<Utc>,
        collapsed: bool,
    ) -> Applied {
        let Some(target) = state.target_mut(&report.target) else {
            return Applied {
                gone: true,
                ..Applied::default()
            };
        };

        let mut applied = Applied::default();
        let page = match report.result {
            Err(err) => {
                applied.failed = Some(err);
                None
            }
            Ok(FetchOutcome::Skipped { profile }) => {
                target.multiplier = self.multiplier(&profile, now, collapsed);
                target.profile = Some(profile);
                applied.skipped = true;
                None
            }
            Ok(FetchOutcome::Fetched { profile, actions }) => {
                target.multiplier = self.multiplier(&profile, now, collapsed);
                target.profile = Some(profile);
                match report.mode {
                    PollMode::Incremental => {
                        let adv = diff::advance(target.cursor.as_ref(), &actions, recent);
                        if let Some(cursor) = adv.cursor {
                            target.cursor = Some(cursor.clone());
                            applied.cursor = Some(cursor);
                        }
                        applied.fresh = adv.fresh;
                    }
                    PollMode::Baseline => {
                        if target.cursor.is_none() {
                            if let Some(newest) = actions.first() {
                                target.cursor = Some(newest.id.clone());
                                applied.cursor = Some(newest.id.clone());
                            }
                        }
                    }
                }
                Some(actions)
            }
        };

        applied.multiplier = target.multiplier;
        applied.delay = self.reschedule(target, now);

        if let Some(page) = page.filter(|p| !p.is_empty()) {
            state.actions.insert(report.target, page);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionKind;
    use crate::policies::JitterPolicy;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn no_jitter() -> Scheduler {
        Scheduler::new(Config {
            poll_jitter: JitterPolicy::None,
            ..Config::default()
        })
    }

    fn action(id: &str) -> Action {
        Action {
            id: ActionId::new(id),
            kind: ActionKind::Reply,
            actor: "alice".into(),
            subject: String::new(),
            topic_id: None,
            post_number: None,
            title: String::new(),
            excerpt: String::new(),
            category_id: None,
            created_at: None,
        }
    }

    fn seen_minutes_ago(mins: i64) -> Profile {
        Profile {
            last_posted_at: None,
            last_seen_at: Some(t0() - chrono::Duration::minutes(mins)),
        }
    }

    fn fetched(target: &str, mode: PollMode, mins: i64, ids: &[&str]) -> PollReport {
        PollReport {
            target: target.into(),
            mode,
            result: Ok(FetchOutcome::Fetched {
                profile: seen_minutes_ago(mins),
                actions: ids.iter().map(|id| action(id)).collect(),
            }),
        }
    }

    #[test]
    fn test_next_due_picks_lowest_index() {
        let s = no_jitter();
        let mut a = Target::new("a");
        a.next_poll_at = Some(t0() + chrono::Duration::seconds(5));
        let b = Target::new("b");
        let c = Target::new("c");
        assert_eq!(s.next_due(&[a.clone(), b, c], t0()), Some(1));

        a.next_poll_at = Some(t0() + chrono::Duration::seconds(5));
        assert_eq!(s.next_due(&[a], t0()), None);
    }

    #[test]
    fn test_first_incremental_poll_is_baseline() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        state.insert_target(Target::new("alice"));
        let mut recent = RecentlySeenSet::new(200);

        let applied = s.apply(
            &mut state,
            &mut recent,
            fetched("alice", PollMode::Incremental, 1, &["a3", "a2", "a1"]),
            t0(),
            false,
        );

        assert!(applied.fresh.is_empty());
        assert_eq!(applied.cursor, Some(ActionId::new("a3")));
        assert_eq!(applied.multiplier, 1.0);
        assert_eq!(applied.delay, Duration::from_secs(60));
        let alice = state.target("alice").unwrap();
        assert_eq!(alice.next_poll_at, Some(t0() + chrono::Duration::seconds(60)));
        assert!(state.has_actions("alice"));
    }

    #[test]
    fn test_incremental_poll_yields_oldest_first() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        state.insert_target(Target::new("alice").with_cursor(Some(ActionId::new("a3"))));
        let mut recent = RecentlySeenSet::new(200);

        let applied = s.apply(
            &mut state,
            &mut recent,
            fetched("alice", PollMode::Incremental, 30, &["a5", "a4", "a3"]),
            t0(),
            true,
        );
        let ids: Vec<&str> = applied.fresh.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a4", "a5"]);
        assert_eq!(applied.multiplier, 8.0);
        assert_eq!(applied.delay, Duration::from_secs(480));
    }

    #[test]
    fn test_baseline_never_moves_existing_cursor() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        state.insert_target(Target::new("alice").with_cursor(Some(ActionId::new("a3"))));
        state.insert_target(Target::new("bob"));
        let mut recent = RecentlySeenSet::new(200);

        let applied = s.apply(&mut state, &mut recent, fetched("alice", PollMode::Baseline, 1, &["a5", "a4"]), t0(), false);
        assert!(applied.fresh.is_empty());
        assert_eq!(applied.cursor, None);
        assert_eq!(state.target("alice").unwrap().cursor, Some(ActionId::new("a3")));

        let applied = s.apply(&mut state, &mut recent, fetched("bob", PollMode::Baseline, 1, &["b2"]), t0(), false);
        assert_eq!(applied.cursor, Some(ActionId::new("b2")));
    }

    #[test]
    fn test_failure_only_reschedules() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        let mut alice = Target::new("alice").with_cursor(Some(ActionId::new("a3")));
        alice.multiplier = 4.0;
        state.insert_target(alice);
        let mut recent = RecentlySeenSet::new(200);

        let report = PollReport {
            target: "alice".into(),
            mode: PollMode::Incremental,
            result: Err(FetchError::Status { code: 502 }),
        };
        let applied = s.apply(&mut state, &mut recent, report, t0(), false);

        assert_eq!(applied.failed, Some(FetchError::Status { code: 502 }));
        assert_eq!(applied.delay, Duration::from_secs(240));
        let alice = state.target("alice").unwrap();
        assert_eq!(alice.cursor, Some(ActionId::new("a3")));
        assert!(alice.profile.is_none());
        assert!(!alice.is_due(t0()));
    }

    #[test]
    fn test_skipped_updates_profile_and_multiplier() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        state.insert_target(Target::new("alice"));
        let mut recent = RecentlySeenSet::new(200);

        let report = PollReport {
            target: "alice".into(),
            mode: PollMode::Incremental,
            result: Ok(FetchOutcome::Skipped { profile: seen_minutes_ago(200) }),
        };
        let applied = s.apply(&mut state, &mut recent, report, t0(), false);
        assert!(applied.skipped);
        assert_eq!(applied.multiplier, 20.0);
        assert_eq!(state.target("alice").unwrap().profile, Some(seen_minutes_ago(200)));
    }

    #[test]
    fn test_removed_target_is_ignored() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        let mut recent = RecentlySeenSet::new(200);
        let applied = s.apply(&mut state, &mut recent, fetched("ghost", PollMode::Incremental, 1, &["g1"]), t0(), false);
        assert!(applied.gone);
        assert!(state.actions.is_empty());
    }

    #[test]
    fn test_plans() {
        let s = no_jitter();
        let mut state = AggregateState::default();
        state.insert_target(Target::new("alice"));
        state.insert_target(Target::new("bob"));

        let cycle = s.cycle(&state);
        assert_eq!(cycle.len(), 2);
        assert!(cycle.iter().all(|p| p.mode == PollMode::Baseline && p.probe.initial));

        let plan = s.plan(&state, &state.targets[0], false);
        assert_eq!(plan.mode, PollMode::Incremental);
        assert!(plan.probe.initial);
    }
}
