//! # Remote fetcher seam.
//!
//! [`Fetcher`] is the collaborator that talks to the forum. It is split in two
//! calls so the cheap profile lookup can short-circuit the expensive action
//! list (see [`fetch_target`]).
//!
//! ```text
//! fetch_target(id, probe)
//!   ├─► profile(id)                    always
//!   ├─► skip?  !initial && last_seen unchanged && actions cached
//!   │      └─ yes ─► Skipped{profile}
//!   └─► actions(id) ─► Fetched{profile, actions}
//! ```

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{Action, Profile};

/// Source of profile metadata and recent actions for a target.
///
/// ### Implementation requirements
/// - Return actions **newest first**.
/// - Decode missing fields and arrays to defaults instead of failing.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Profile metadata of `target`.
    async fn profile(&self, target: &str) -> Result<Profile, FetchError>;

    /// Most recent actions of `target`, newest first.
    async fn actions(&self, target: &str) -> Result<Vec<Action>, FetchError>;
}

/// What the context knew about a target when the poll was planned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PollProbe {
    /// First fetch for this target (admission, poll-all, or no profile yet).
    pub initial: bool,
    /// `last_seen_at` from the previous successful poll.
    pub previous: Option<Profile>,
    /// A page of actions is already cached.
    pub has_actions: bool,
}

impl PollProbe {
    /// True if the action list may be skipped given the fresh `profile`.
    ///
    /// Advisory only: a false "changed" just costs one extra fetch.
    pub fn can_skip(&self, profile: &Profile) -> bool {
        if self.initial || !self.has_actions {
            return false;
        }
        match &self.previous {
            Some(prev) => prev.last_seen_at == profile.last_seen_at,
            None => false,
        }
    }
}

/// Result of one successful poll.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Profile and a fresh page of actions (newest first).
    Fetched {
        /// Fresh profile.
        profile: Profile,
        /// Fresh page.
        actions: Vec<Action>,
    },
    /// Profile unchanged; the action list was not requested.
    Skipped {
        /// Fresh profile.
        profile: Profile,
    },
}

impl FetchOutcome {
    /// Profile carried by either variant.
    pub fn profile(&self) -> &Profile {
        match self {
            FetchOutcome::Fetched { profile, .. } | FetchOutcome::Skipped { profile } => profile,
        }
    }
}

/// Polls one target, skipping the action list when `probe` allows it.
pub async fn fetch_target(
    fetcher: &dyn Fetcher,
    target: &str,
    probe: &PollProbe,
) -> Result<FetchOutcome, FetchError> {
    let profile = fetcher.profile(target).await?;
    if probe.can_skip(&profile) {
        return Ok(FetchOutcome::Skipped { profile });
    }
    let actions = fetcher.actions(target).await?;
    Ok(FetchOutcome::Fetched { profile, actions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        profile: Profile,
        action_calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for Counting {
        async fn profile(&self, _target: &str) -> Result<Profile, FetchError> {
            Ok(self.profile.clone())
        }

        async fn actions(&self, _target: &str) -> Result<Vec<Action>, FetchError> {
            self.action_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn profile(secs: i64) -> Profile {
        Profile {
            last_posted_at: None,
            last_seen_at: Utc.timestamp_opt(secs, 0).single(),
        }
    }

    #[tokio::test]
    async fn test_unchanged_profile_skips_actions() {
        let f = Counting { profile: profile(100), action_calls: AtomicUsize::new(0) };
        let probe = PollProbe { initial: false, previous: Some(profile(100)), has_actions: true };

        let out = fetch_target(&f, "alice", &probe).await.unwrap();
        assert_eq!(out, FetchOutcome::Skipped { profile: profile(100) });
        assert_eq!(f.action_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initial_or_empty_cache_never_skips() {
        let f = Counting { profile: profile(100), action_calls: AtomicUsize::new(0) };

        let initial = PollProbe { initial: true, previous: Some(profile(100)), has_actions: true };
        assert!(matches!(fetch_target(&f, "a", &initial).await, Ok(FetchOutcome::Fetched { .. })));

        let empty = PollProbe { initial: false, previous: Some(profile(100)), has_actions: false };
        assert!(matches!(fetch_target(&f, "a", &empty).await, Ok(FetchOutcome::Fetched { .. })));

        let changed = PollProbe { initial: false, previous: Some(profile(50)), has_actions: true };
        assert!(matches!(fetch_target(&f, "a", &changed).await, Ok(FetchOutcome::Fetched { .. })));

        assert_eq!(f.action_calls.load(Ordering::SeqCst), 3);
    }
}
