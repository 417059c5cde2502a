//! # Leader election state machine.
//!
//! [`Election`] is driven only by received envelopes and timer expiries; it
//! never looks at shared state. Each input returns the [`Directive`]s the
//! owning context must carry out (publish, arm/disarm a timer, start or stop
//! polling).
//!
//! ## States
//! ```text
//!                 start()                 window elapsed / focus
//! Initializing ───────────► ElectionPending ─────────────────────► Leader
//!      │                        │  leader_here / leader_takeover     │
//!      │ leader_takeover        ▼                                    │ stronger leader_takeover
//!      └──────────────────► Follower ◄───────────────────────────────┘ stronger leader_here
//!                             │   ▲
//!             leader_resign   │   │
//!             + rejoin jitter ▼   │
//!                      ElectionPending
//! ```
//!
//! ## Authority
//! Every envelope carries `(term, origin)`. Promotion claims
//! `term = highest term seen + 1`. A leader demotes only when a competing
//! claim is strictly greater than its own; a weaker `leader_takeover` is
//! answered with a re-asserting one. Without message loss, any number of
//! simultaneous promotions converges to the single greatest claim.

use crate::transport::{ContextId, Envelope, Message};

/// Leadership role of one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Booting; nothing broadcast yet.
    Initializing,
    /// `leader_check` sent, waiting out the election window.
    ElectionPending,
    /// Someone else leads; render broadcasts and forward commands.
    Follower,
    /// This context polls and broadcasts.
    Leader,
}

impl Role {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Role::Initializing => "initializing",
            Role::ElectionPending => "election_pending",
            Role::Follower => "follower",
            Role::Leader => "leader",
        }
    }

    /// True once the election has an outcome for this context.
    pub fn is_settled(&self) -> bool {
        matches!(self, Role::Follower | Role::Leader)
    }
}

/// Why a context promoted itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Nobody answered `leader_check` within the window.
    WindowElapsed,
    /// The context regained foreground focus.
    Focus,
}

impl Promotion {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Promotion::WindowElapsed => "window_elapsed",
            Promotion::Focus => "focus",
        }
    }
}

/// Side effect requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Publish this message with the current term.
    Announce(Message),
    /// Start the election window timer.
    ArmWindow,
    /// Cancel the election window timer.
    DisarmWindow,
    /// Start the jittered rejoin timer.
    ArmRejoin,
    /// Became leader: start ticking and run a poll-all.
    Promoted(Promotion),
    /// Stopped leading: stop ticking.
    Demoted,
    /// Publish the full state now (`data_update`).
    ShareState,
}

/// Per-context election state.
#[derive(Debug, Clone)]
pub struct Election {
    id: ContextId,
    role: Role,
    term: u64,
    seen: u64,
    awaiting_rejoin: bool,
}

impl Election {
    /// Fresh state machine for context `id`.
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            role: Role::Initializing,
            term: 0,
            seen: 0,
            awaiting_rejoin: false,
        }
    }

    /// Current role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Term stamped on outgoing envelopes: own claim while leading, else the highest seen.
    pub fn term(&self) -> u64 {
        if self.role == Role::Leader {
            self.term
        } else {
            self.seen.max(self.term)
        }
    }

    /// True while this context leads.
    pub fn is_leader(&self) -> bool {
        self.role == Role::Leader
    }

    /// Starts (or restarts) an election: ask who leads and wait out the window.
    pub fn start(&mut self) -> Vec<Directive> {
        if self.role == Role::Leader {
            return Vec::new();
        }
        self.role = Role::ElectionPending;
        self.awaiting_rejoin = false;
        vec![Directive::Announce(Message::LeaderCheck), Directive::ArmWindow]
    }

    /// Reacts to an envelope from another context.
    pub fn on_envelope(&mut self, env: &Envelope) -> Vec<Directive> {
        self.seen = self.seen.max(env.term);

        match (&env.message, self.role) {
            (Message::LeaderCheck, Role::Leader) => vec![Directive::Announce(Message::LeaderHere)],

            (Message::LeaderHere, Role::ElectionPending) => {
                self.role = Role::Follower;
                vec![Directive::DisarmWindow, Directive::Announce(Message::DataRequest)]
            }
            (Message::LeaderHere, Role::Leader) => {
                if self.outranked_by(env) {
                    self.demote()
                } else {
                    Vec::new()
                }
            }
            (Message::LeaderHere, Role::Follower) => {
                self.awaiting_rejoin = false;
                Vec::new()
            }

            (Message::DataRequest, Role::Leader) => vec![Directive::ShareState],

            (Message::LeaderResign, Role::Follower) => {
                self.awaiting_rejoin = true;
                vec![Directive::ArmRejoin]
            }

            (Message::LeaderTakeover, Role::Leader) => {
                if self.outranked_by(env) {
                    self.demote()
                } else {
                    vec![Directive::Announce(Message::LeaderTakeover)]
                }
            }
            (Message::LeaderTakeover, Role::ElectionPending) => {
                self.role = Role::Follower;
                vec![Directive::DisarmWindow]
            }
            (Message::LeaderTakeover, Role::Initializing | Role::Follower) => {
                self.role = Role::Follower;
                self.awaiting_rejoin = false;
                Vec::new()
            }

            _ => Vec::new(),
        }
    }

    /// The election window elapsed without a `leader_here`.
    pub fn on_window_elapsed(&mut self) -> Vec<Directive> {
        if self.role != Role::ElectionPending {
            return Vec::new();
        }
        self.promote(Promotion::WindowElapsed)
    }

    /// The post-resignation wait elapsed.
    pub fn on_rejoin_elapsed(&mut self) -> Vec<Directive> {
        if !self.awaiting_rejoin || self.role != Role::Follower {
            return Vec::new();
        }
        self.start()
    }

    /// The context regained foreground focus: take over unconditionally.
    pub fn on_focus(&mut self) -> Vec<Directive> {
        match self.role {
            Role::Leader => Vec::new(),
            Role::ElectionPending => {
                let mut out = vec![Directive::DisarmWindow];
                out.extend(self.promote(Promotion::Focus));
                out
            }
            Role::Initializing | Role::Follower => self.promote(Promotion::Focus),
        }
    }

    /// The context is shutting down gracefully.
    pub fn on_shutdown(&mut self) -> Vec<Directive> {
        let was_leader = self.role == Role::Leader;
        self.role = Role::Initializing;
        self.awaiting_rejoin = false;
        if was_leader {
            vec![Directive::Announce(Message::LeaderResign)]
        } else {
            Vec::new()
        }
    }

    fn outranked_by(&self, env: &Envelope) -> bool {
        env.authority() > (self.term, self.id)
    }

    fn promote(&mut self, why: Promotion) -> Vec<Directive> {
        self.term = self.seen.max(self.term) + 1;
        self.seen = self.term;
        self.role = Role::Leader;
        self.awaiting_rejoin = false;
        vec![Directive::Announce(Message::LeaderTakeover), Directive::Promoted(why)]
    }

    fn demote(&mut self) -> Vec<Directive> {
        self.role = Role::Follower;
        vec![Directive::Demoted, Directive::ShareState]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(origin: u64, term: u64, message: Message) -> Envelope {
        Envelope {
            origin: test_id(origin),
            term,
            message,
        }
    }

    fn test_id(n: u64) -> ContextId {
        serde_json::from_value(serde_json::json!(n)).unwrap()
    }

    #[test]
    fn test_unanswered_check_promotes() {
        let mut e = Election::new(test_id(1));
        assert_eq!(e.role(), Role::Initializing);
        assert_eq!(
            e.start(),
            vec![Directive::Announce(Message::LeaderCheck), Directive::ArmWindow]
        );
        assert_eq!(e.role(), Role::ElectionPending);

        let out = e.on_window_elapsed();
        assert_eq!(
            out,
            vec![
                Directive::Announce(Message::LeaderTakeover),
                Directive::Promoted(Promotion::WindowElapsed)
            ]
        );
        assert!(e.is_leader());
        assert_eq!(e.term(), 1);
    }

    #[test]
    fn test_leader_here_makes_follower_and_requests_data() {
        let mut e = Election::new(test_id(1));
        e.start();
        let out = e.on_envelope(&env(7, 3, Message::LeaderHere));
        assert_eq!(
            out,
            vec![Directive::DisarmWindow, Directive::Announce(Message::DataRequest)]
        );
        assert_eq!(e.role(), Role::Follower);
        assert_eq!(e.term(), 3);
        assert!(e.on_window_elapsed().is_empty());
    }

    #[test]
    fn test_leader_answers_check_and_data_request() {
        let mut e = Election::new(test_id(1));
        e.start();
        e.on_window_elapsed();
        assert_eq!(
            e.on_envelope(&env(2, 0, Message::LeaderCheck)),
            vec![Directive::Announce(Message::LeaderHere)]
        );
        assert_eq!(
            e.on_envelope(&env(2, 1, Message::DataRequest)),
            vec![Directive::ShareState]
        );
    }

    #[test]
    fn test_stronger_takeover_demotes_weaker_is_answered() {
        let mut low = Election::new(test_id(1));
        low.start();
        low.on_window_elapsed();

        let mut high = Election::new(test_id(2));
        high.start();
        high.on_window_elapsed();

        // Same term; origin breaks the tie.
        let from_high = env(2, high.term(), Message::LeaderTakeover);
        let from_low = env(1, low.term(), Message::LeaderTakeover);

        assert_eq!(low.on_envelope(&from_high), vec![Directive::Demoted, Directive::ShareState]);
        assert_eq!(low.role(), Role::Follower);

        assert_eq!(
            high.on_envelope(&from_low),
            vec![Directive::Announce(Message::LeaderTakeover)]
        );
        assert!(high.is_leader());
    }

    #[test]
    fn test_focus_outranks_current_leader() {
        let mut leader = Election::new(test_id(9));
        leader.start();
        leader.on_window_elapsed();

        let mut tab = Election::new(test_id(1));
        tab.start();
        tab.on_envelope(&env(9, leader.term(), Message::LeaderHere));

        let out = tab.on_focus();
        assert_eq!(out[1], Directive::Promoted(Promotion::Focus));
        assert_eq!(tab.term(), leader.term() + 1);

        let out = leader.on_envelope(&env(1, tab.term(), Message::LeaderTakeover));
        assert_eq!(out, vec![Directive::Demoted, Directive::ShareState]);
    }

    #[test]
    fn test_resign_arms_rejoin_then_restarts() {
        let mut e = Election::new(test_id(1));
        e.start();
        e.on_envelope(&env(5, 1, Message::LeaderHere));

        assert_eq!(e.on_envelope(&env(5, 1, Message::LeaderResign)), vec![Directive::ArmRejoin]);
        let out = e.on_rejoin_elapsed();
        assert_eq!(out, vec![Directive::Announce(Message::LeaderCheck), Directive::ArmWindow]);
        assert_eq!(e.role(), Role::ElectionPending);
    }

    #[test]
    fn test_takeover_during_rejoin_wait_cancels_it() {
        let mut e = Election::new(test_id(1));
        e.start();
        e.on_envelope(&env(5, 1, Message::LeaderHere));
        e.on_envelope(&env(5, 1, Message::LeaderResign));
        e.on_envelope(&env(6, 2, Message::LeaderTakeover));
        assert!(e.on_rejoin_elapsed().is_empty());
        assert_eq!(e.role(), Role::Follower);
    }

    #[test]
    fn test_shutdown_resigns_only_when_leading() {
        let mut e = Election::new(test_id(1));
        e.start();
        assert!(e.on_shutdown().is_empty());

        e.start();
        e.on_window_elapsed();
        assert_eq!(e.on_shutdown(), vec![Directive::Announce(Message::LeaderResign)]);
        assert!(!e.is_leader());
    }
}
