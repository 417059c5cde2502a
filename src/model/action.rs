//! # Notifiable actions and their identity.
//!
//! An [`Action`] is one event worth surfacing for a monitored account: a
//! reply, a new topic, a like or a reaction. Actions are immutable once
//! decoded; the diff engine only compares their [`ActionId`]s.
//!
//! ## Identity
//! The remote service does not give every action a stable id, so identity is
//! derived by a fallback chain:
//!
//! ```text
//! explicit id             → "<id>"
//! topic id + post number  → "<topic>_<post>"
//! creation timestamp      → "ts_<unix millis>"
//! ```
//!
//! The timestamp fallback is ambiguous: two actions created in the same
//! millisecond share an id and the second one is treated as already seen.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identity of an [`Action`]; also used as a target's cursor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Wraps an already-derived id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an id with the fallback chain `explicit → topic_post → ts_millis`.
    ///
    /// `created_at` feeds the timestamp fallback; when it is missing too,
    /// `observed_at` (the fetch time) is used instead.
    pub fn derive(
        explicit: Option<&str>,
        topic_id: Option<u64>,
        post_number: Option<u64>,
        created_at: Option<DateTime<Utc>>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        if let Some(id) = explicit.filter(|id| !id.is_empty()) {
            return Self(id.to_string());
        }
        if let (Some(topic), Some(post)) = (topic_id, post_number) {
            return Self(format!("{topic}_{post}"));
        }
        let at = created_at.unwrap_or(observed_at);
        Self(format!("ts_{}", at.timestamp_millis()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id came from the timestamp fallback.
    pub fn is_timestamp_fallback(&self) -> bool {
        self.0.starts_with("ts_")
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category tag of an action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// The account liked a post.
    Like,
    /// The account opened a topic.
    NewTopic,
    /// The account replied in a topic.
    Reply,
    /// The account reacted to a post (value is the reaction name).
    Reaction(String),
    /// Any other remote action type.
    Other(i64),
}

impl ActionKind {
    /// Maps the remote numeric action type.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ActionKind::Like,
            4 => ActionKind::NewTopic,
            5 => ActionKind::Reply,
            other => ActionKind::Other(other),
        }
    }

    /// Likes and reactions carry the other party's post as excerpt.
    pub fn is_appreciation(&self) -> bool {
        matches!(self, ActionKind::Like | ActionKind::Reaction(_))
    }
}

/// One notifiable event of a monitored account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Identity (see module docs for the fallback chain).
    pub id: ActionId,
    /// Category tag.
    pub kind: ActionKind,
    /// Account that performed the action (the monitored target).
    pub actor: String,
    /// Counterpart account (author of the liked/reacted/replied-to post).
    #[serde(default)]
    pub subject: String,
    /// Topic the action belongs to.
    #[serde(default)]
    pub topic_id: Option<u64>,
    /// Post number within the topic.
    #[serde(default)]
    pub post_number: Option<u64>,
    /// Topic title.
    #[serde(default)]
    pub title: String,
    /// Plain-text excerpt.
    #[serde(default)]
    pub excerpt: String,
    /// Forum category id.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Remote creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Action {
    /// Relative link to the post (`/t/<topic>/<post>`), when both parts are known.
    pub fn link(&self) -> Option<String> {
        match (self.topic_id, self.post_number) {
            (Some(topic), Some(post)) => Some(format!("/t/{topic}/{post}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    #[test]
    fn test_explicit_id_wins() {
        let id = ActionId::derive(Some("r-77"), Some(1), Some(2), Some(at(5)), at(9));
        assert_eq!(id.as_str(), "r-77");
        assert!(!id.is_timestamp_fallback());
    }

    #[test]
    fn test_empty_explicit_id_falls_through_to_composite() {
        let id = ActionId::derive(Some(""), Some(1043), Some(7), None, at(9));
        assert_eq!(id.as_str(), "1043_7");
    }

    #[test]
    fn test_timestamp_fallback_uses_creation_then_observation() {
        let created = ActionId::derive(None, Some(10), None, Some(at(1_700)), at(9_999));
        assert_eq!(created.as_str(), "ts_1700");
        assert!(created.is_timestamp_fallback());

        let observed = ActionId::derive(None, None, None, None, at(9_999));
        assert_eq!(observed.as_str(), "ts_9999");
    }

    #[test]
    fn test_timestamp_fallback_collides_for_same_instant() {
        // Two distinct remote actions created in the same millisecond without
        // explicit or composite identity collapse to one id; the second would be
        // suppressed as already seen.
        let a = ActionId::derive(None, None, None, Some(at(42)), at(100));
        let b = ActionId::derive(None, None, None, Some(at(42)), at(200));
        assert_eq!(a, b);
    }

    #[test]
    fn test_kind_codes_and_link() {
        assert_eq!(ActionKind::from_code(1), ActionKind::Like);
        assert_eq!(ActionKind::from_code(5), ActionKind::Reply);
        assert_eq!(ActionKind::from_code(9), ActionKind::Other(9));
        assert!(ActionKind::Reaction("heart".into()).is_appreciation());

        let action = Action {
            id: ActionId::new("1_2"),
            kind: ActionKind::Reply,
            actor: "alice".into(),
            subject: "bob".into(),
            topic_id: Some(1),
            post_number: Some(2),
            title: String::new(),
            excerpt: String::new(),
            category_id: None,
            created_at: None,
        };
        assert_eq!(action.link().as_deref(), Some("/t/1/2"));
    }
}
