//! # Wire schema of the shared bus.
//!
//! [`Message`] is the tagged union every context understands. It is
//! internally tagged on `type`, so a `cmd_add_user` travels as
//! `{"type":"cmd_add_user","target_id":"alice"}`.
//!
//! ```text
//! election      leader_check · leader_here · leader_takeover · leader_resign
//! replication   data_request · data_update{state} · new_action{action}
//! commands      cmd_refresh_all · cmd_refresh_user · cmd_add_user
//!               cmd_remove_user · cmd_config_sync{key, value}
//! ```
//!
//! Every message travels inside an [`Envelope`] stamped with the sender's
//! [`ContextId`] and leadership term; the election uses both to decide which
//! of two `leader_takeover`s is more authoritative.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

use crate::model::{Action, AggregateState};

/// Process-wide counter for context identities.
static CONTEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of one execution context (one tab).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        Self(CONTEXT_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Config keys that can be synchronised across contexts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// In-page overlay notifications.
    NotifyOverlay,
    /// Operating-system notifications.
    NotifySystem,
}

/// One message on the shared bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// "Is anyone leading?" (sent when an election starts).
    LeaderCheck,
    /// Answer of the current leader to `leader_check`.
    LeaderHere,
    /// A follower asks the leader for a full snapshot.
    DataRequest,
    /// The leader is shutting down gracefully.
    LeaderResign,
    /// The sender has made itself leader.
    LeaderTakeover,
    /// Full aggregate state published by the leader after each pass.
    DataUpdate(Arc<AggregateState>),
    /// A newly discovered action, published when the leader delivers it.
    NewAction {
        /// The action.
        action: Arc<Action>,
    },
    /// Follower asks the leader to poll every target.
    CmdRefreshAll,
    /// Follower asks the leader to poll one target now.
    CmdRefreshUser {
        /// Target to poll.
        target_id: String,
    },
    /// Follower asks the leader to start monitoring a target.
    CmdAddUser {
        /// Target to add.
        target_id: String,
    },
    /// Follower asks the leader to stop monitoring a target.
    CmdRemoveUser {
        /// Target to remove.
        target_id: String,
    },
    /// A notification flag changed somewhere; everyone applies it.
    CmdConfigSync {
        /// Which flag.
        key: ConfigKey,
        /// New value.
        value: bool,
    },
}

impl Message {
    /// Returns the wire tag, for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Message::LeaderCheck => "leader_check",
            Message::LeaderHere => "leader_here",
            Message::DataRequest => "data_request",
            Message::LeaderResign => "leader_resign",
            Message::LeaderTakeover => "leader_takeover",
            Message::DataUpdate(_) => "data_update",
            Message::NewAction { .. } => "new_action",
            Message::CmdRefreshAll => "cmd_refresh_all",
            Message::CmdRefreshUser { .. } => "cmd_refresh_user",
            Message::CmdAddUser { .. } => "cmd_add_user",
            Message::CmdRemoveUser { .. } => "cmd_remove_user",
            Message::CmdConfigSync { .. } => "cmd_config_sync",
        }
    }

    /// True for the five election signals.
    pub fn is_election(&self) -> bool {
        matches!(
            self,
            Message::LeaderCheck
                | Message::LeaderHere
                | Message::LeaderResign
                | Message::LeaderTakeover
                | Message::DataRequest
        )
    }
}

/// A [`Message`] plus the sender's identity and leadership term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sending context.
    pub origin: ContextId,
    /// Sender's term at send time (its claim if it leads, else the highest it has seen).
    pub term: u64,
    /// Payload.
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    /// Authority of this envelope as `(term, origin)`; larger wins.
    pub fn authority(&self) -> (u64, ContextId) {
        (self.term, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signal_wire_shape() {
        let v = serde_json::to_value(Message::LeaderCheck).unwrap();
        assert_eq!(v, json!({"type": "leader_check"}));
    }

    #[test]
    fn test_command_wire_shape() {
        let v = serde_json::to_value(Message::CmdAddUser { target_id: "alice".into() }).unwrap();
        assert_eq!(v, json!({"type": "cmd_add_user", "target_id": "alice"}));

        let v = serde_json::to_value(Message::CmdConfigSync {
            key: ConfigKey::NotifySystem,
            value: false,
        })
        .unwrap();
        assert_eq!(v, json!({"type": "cmd_config_sync", "key": "notify_system", "value": false}));
    }

    #[test]
    fn test_data_update_is_flattened() {
        let v = serde_json::to_value(Message::DataUpdate(Arc::default())).unwrap();
        assert_eq!(v["type"], "data_update");
        assert!(v["targets"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_envelope_authority_orders_by_term_then_origin() {
        let low = Envelope { origin: ContextId(9), term: 1, message: Message::LeaderTakeover };
        let high = Envelope { origin: ContextId(2), term: 2, message: Message::LeaderTakeover };
        let tie = Envelope { origin: ContextId(10), term: 1, message: Message::LeaderTakeover };
        assert!(high.authority() > low.authority());
        assert!(tie.authority() > low.authority());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Message::LeaderResign.label(), "leader_resign");
        assert!(Message::DataRequest.is_election());
        assert!(!Message::CmdRefreshAll.is_election());
    }
}
