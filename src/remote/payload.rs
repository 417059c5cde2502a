//! # Remote payload decoding.
//!
//! The forum answers with loosely-shaped JSON. Everything here is lenient:
//! unknown fields are ignored, missing fields and arrays default to empty, and
//! unparsable timestamps become `None`. Only a profile without a `user` object
//! is an error, since there is nothing to schedule on.
//!
//! ## Normalization
//! ```text
//! user_actions[]  ─┐  likes: swap username ↔ acting_username
//!                  ├─► merge ─► sort newest first ─► truncate(limit)
//! reactions[]     ─┘  actor = reacting user, subject = post author
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;
use crate::model::{Action, ActionId, ActionKind, Profile};

/// Default page size of the merged action list.
pub const PAGE_LIMIT: usize = 10;

fn lenient_time<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

fn lenient_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
struct ProfileBody {
    #[serde(default)]
    user: Option<UserBody>,
}

#[derive(Debug, Default, Deserialize)]
struct UserBody {
    #[serde(default, deserialize_with = "lenient_time")]
    last_seen_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    last_posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct UserActionsBody {
    #[serde(default)]
    user_actions: Vec<UserAction>,
}

#[derive(Debug, Default, Deserialize)]
struct UserAction {
    #[serde(default)]
    action_type: Option<i64>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    acting_username: Option<String>,
    #[serde(default)]
    topic_id: Option<u64>,
    #[serde(default)]
    post_number: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    category_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_time")]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct Reaction {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    post: Option<ReactionPost>,
    #[serde(default)]
    reaction: Option<ReactionValue>,
}

#[derive(Debug, Default, Deserialize)]
struct UserRef {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TopicRef {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionPost {
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    topic_id: Option<u64>,
    #[serde(default)]
    post_number: Option<u64>,
    #[serde(default)]
    topic_title: Option<String>,
    #[serde(default)]
    topic: Option<TopicRef>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    category_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionValue {
    #[serde(default)]
    reaction_value: Option<String>,
}

/// Decodes `GET /u/{id}.json`.
pub fn decode_profile(body: Value) -> Result<Profile, FetchError> {
    let parsed: ProfileBody = serde_json::from_value(body).map_err(|e| FetchError::Decode {
        error: e.to_string(),
    })?;
    let user = parsed.user.ok_or_else(|| FetchError::Decode {
        error: "profile has no user object".into(),
    })?;
    Ok(Profile {
        last_posted_at: user.last_posted_at,
        last_seen_at: user.last_seen_at,
    })
}

/// Decodes and merges the user-actions and reactions bodies into one page.
///
/// `observed_at` feeds the id fallback of actions without any timestamp.
pub fn decode_actions(
    user_actions: Value,
    reactions: Value,
    observed_at: DateTime<Utc>,
    limit: usize,
) -> Vec<Action> {
    let page: UserActionsBody = serde_json::from_value(user_actions).unwrap_or_default();
    let reactions: Vec<Reaction> = serde_json::from_value(reactions).unwrap_or_default();

    let mut all: Vec<Action> = page
        .user_actions
        .into_iter()
        .map(|a| from_user_action(a, observed_at))
        .chain(reactions.into_iter().map(|r| from_reaction(r, observed_at)))
        .collect();

    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all.truncate(limit);
    all
}

fn from_user_action(a: UserAction, observed_at: DateTime<Utc>) -> Action {
    let kind = ActionKind::from_code(a.action_type.unwrap_or_default());
    let username = a.username.unwrap_or_default();
    let acting = a.acting_username.unwrap_or_default();
    // For likes the remote reports the liked post's author as `username`.
    let (actor, subject) = if kind == ActionKind::Like {
        (acting, username)
    } else {
        (username, acting)
    };
    Action {
        id: ActionId::derive(None, a.topic_id, a.post_number, a.created_at, observed_at),
        kind,
        actor,
        subject,
        topic_id: a.topic_id,
        post_number: a.post_number,
        title: a.title.unwrap_or_default(),
        excerpt: a.excerpt.unwrap_or_default(),
        category_id: a.category_id,
        created_at: a.created_at,
    }
}

fn from_reaction(r: Reaction, observed_at: DateTime<Utc>) -> Action {
    let post = r.post.unwrap_or_default();
    let subject = post
        .user
        .and_then(|u| u.username)
        .or(post.username)
        .unwrap_or_default();
    let title = post
        .topic_title
        .or_else(|| post.topic.and_then(|t| t.title))
        .unwrap_or_default();
    let value = r
        .reaction
        .and_then(|v| v.reaction_value)
        .unwrap_or_else(|| "reaction".to_string());
    Action {
        id: ActionId::derive(
            r.id.as_deref(),
            post.topic_id,
            post.post_number,
            r.created_at,
            observed_at,
        ),
        kind: ActionKind::Reaction(value),
        actor: r.user.and_then(|u| u.username).unwrap_or_default(),
        subject,
        topic_id: post.topic_id,
        post_number: post.post_number,
        title,
        excerpt: post.excerpt.unwrap_or_default(),
        category_id: post.category_id,
        created_at: r.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_profile_decodes_lenient_timestamps() {
        let p = decode_profile(json!({
            "user": {"last_seen_at": "2024-05-01T11:58:00.000Z", "last_posted_at": "garbage"}
        }))
        .unwrap();
        assert_eq!(p.last_seen_at, Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 58, 0).unwrap()));
        assert_eq!(p.last_posted_at, None);
    }

    #[test]
    fn test_profile_without_user_is_decode_error() {
        let err = decode_profile(json!({"errors": ["not found"]})).unwrap_err();
        assert_eq!(err.as_label(), "fetch_decode");
    }

    #[test]
    fn test_merge_sorts_swaps_and_truncates() {
        let actions = json!({"user_actions": [
            {"action_type": 5, "username": "alice", "acting_username": "alice",
             "topic_id": 10, "post_number": 2, "title": "Rust", "created_at": "2024-05-01T10:00:00Z"},
            {"action_type": 1, "username": "bob", "acting_username": "alice",
             "topic_id": 11, "post_number": 1, "created_at": "2024-05-01T11:00:00Z"}
        ]});
        let reactions = json!([
            {"id": 77, "created_at": "2024-05-01T11:30:00Z", "user": {"username": "alice"},
             "post": {"user": {"username": "carol"}, "topic_id": 12, "post_number": 4,
                      "topic": {"title": "Async"}},
             "reaction": {"reaction_value": "heart"}}
        ]);

        let page = decode_actions(actions, reactions, now(), 2);
        assert_eq!(page.len(), 2);

        assert_eq!(page[0].id.as_str(), "77");
        assert_eq!(page[0].kind, ActionKind::Reaction("heart".into()));
        assert_eq!(page[0].actor, "alice");
        assert_eq!(page[0].subject, "carol");
        assert_eq!(page[0].title, "Async");

        assert_eq!(page[1].id.as_str(), "11_1");
        assert_eq!(page[1].kind, ActionKind::Like);
        assert_eq!(page[1].actor, "alice");
        assert_eq!(page[1].subject, "bob");
    }

    #[test]
    fn test_malformed_bodies_degrade_to_empty() {
        let page = decode_actions(json!({"user_actions": "nope"}), json!({"error": 1}), now(), PAGE_LIMIT);
        assert!(page.is_empty());

        let page = decode_actions(json!({}), json!([{}]), now(), PAGE_LIMIT);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].kind, ActionKind::Reaction("reaction".into()));
        assert_eq!(page[0].id, ActionId::new(format!("ts_{}", now().timestamp_millis())));
    }
}
