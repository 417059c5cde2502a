//! # Monitored targets.
//!
//! A [`Target`] is one remote account under watch. It is created when the
//! account is added, mutated by the scheduler after every fetch, and dropped
//! (with its cursor and multiplier) when the account is un-monitored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ActionId;

/// Last known activity timestamps of a remote account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// When the account last posted.
    #[serde(default)]
    pub last_posted_at: Option<DateTime<Utc>>,
    /// When the account was last seen online.
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// A monitored remote account and its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Remote account id (username).
    pub id: String,
    /// Id of the newest action already processed; the diff boundary.
    #[serde(default)]
    pub cursor: Option<ActionId>,
    /// Activity-derived factor on the base poll interval.
    #[serde(default = "Target::default_multiplier")]
    pub multiplier: f64,
    /// Earliest time the scheduler may poll this target again (`None` = due now).
    #[serde(default)]
    pub next_poll_at: Option<DateTime<Utc>>,
    /// Profile seen on the last successful poll.
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Target {
    /// Creates a target that is due immediately and has no cursor.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cursor: None,
            multiplier: Self::default_multiplier(),
            next_poll_at: None,
            profile: None,
        }
    }

    /// Restores a persisted cursor.
    pub fn with_cursor(mut self, cursor: Option<ActionId>) -> Self {
        self.cursor = cursor;
        self
    }

    /// True if the scheduler may poll the target at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_poll_at.is_none_or(|at| now >= at)
    }

    /// `last_seen_at` of the cached profile, if any.
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.profile.as_ref().and_then(|p| p.last_seen_at)
    }

    fn default_multiplier() -> f64 {
        1.0
    }
}
