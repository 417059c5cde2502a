//! # Events emitted by an execution context.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Election events**: the context's role changes (started, promoted, demoted)
//! - **Polling events**: scheduler activity (starting, skipped, failed, scheduled)
//! - **Presentation events**: what the presentation sink renders (delivered action, new view)
//! - **Management events**: monitored-set changes, rejected commands, persistence failures
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! emitting context, the target, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events from several contexts are merged.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use seekvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::PollFailed)
//!     .with_target("alice")
//!     .with_reason("fetch timed out after 15s")
//!     .with_delay(Duration::from_secs(64));
//!
//! assert_eq!(ev.kind, EventKind::PollFailed);
//! assert_eq!(ev.target.as_deref(), Some("alice"));
//! assert_eq!(ev.delay_ms, Some(64_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Role;
use crate::model::{Action, AggregateState, NotificationChannels};
use crate::transport::ContextId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of context events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Election events ===
    /// The context broadcast `leader_check` and armed its election window.
    ///
    /// Sets: `context`, `term`
    ElectionStarted,

    /// The context became leader.
    ///
    /// Sets: `context`, `term`, `reason` (`"window_elapsed"` or `"focus"`)
    Promoted,

    /// The context stopped leading after a more authoritative takeover.
    ///
    /// Sets: `context`, `term` (the winner's)
    Demoted,

    // === Polling events ===
    /// A fetch for a target is about to start.
    ///
    /// Sets: `context`, `target`, `reason` (`"tick"`, `"poll_all"`, `"refresh"`, `"admit"`)
    PollStarting,

    /// The action list was not fetched because the profile did not change.
    ///
    /// Sets: `context`, `target`
    PollSkipped,

    /// A fetch failed; the target is rescheduled anyway.
    ///
    /// Sets: `context`, `target`, `reason`
    PollFailed,

    /// The next poll time of a target was computed.
    ///
    /// Sets: `context`, `target`, `delay_ms`, `multiplier`
    PollScheduled,

    /// The diff engine found new actions for a target.
    ///
    /// Sets: `context`, `target`, `count`
    ActionsDiscovered,

    // === Presentation events ===
    /// One new action is handed to the notification sink.
    ///
    /// Sets: `context`, `target`, `action`, `channels`
    ActionDelivered,

    /// The context's view changed and should be re-rendered.
    ///
    /// Sets: `context`, `state`, `role`
    StateRendered,

    // === Management events ===
    /// A target joined the monitored set.
    ///
    /// Sets: `context`, `target`
    TargetAdded,

    /// A target left the monitored set.
    ///
    /// Sets: `context`, `target`
    TargetRemoved,

    /// The leader refused a command (duplicate, limit reached, failed admission fetch).
    ///
    /// Sets: `context`, `target`, `reason`
    CommandRejected,

    /// Writing the persistent config failed; the patch is retried next pass.
    ///
    /// Sets: `context`, `reason`
    PersistFailed,

    /// The context's run loop exited.
    ///
    /// Sets: `context`
    ContextStopped,
}

/// Context event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Emitting context.
    pub context: Option<ContextId>,
    /// Target the event concerns.
    pub target: Option<Arc<str>>,
    /// Human-readable reason (errors, rejection details, etc.).
    pub reason: Option<Arc<str>>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Number of items (e.g. discovered actions).
    pub count: Option<u32>,
    /// Backoff multiplier in effect.
    pub multiplier: Option<f64>,
    /// Leadership term.
    pub term: Option<u64>,
    /// Role of the emitting context.
    pub role: Option<Role>,
    /// Delivered action.
    pub action: Option<Arc<Action>>,
    /// View to render.
    pub state: Option<Arc<AggregateState>>,
    /// Channels a delivered action should be shown on.
    pub channels: Option<NotificationChannels>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            context: None,
            target: None,
            reason: None,
            delay_ms: None,
            count: None,
            multiplier: None,
            term: None,
            role: None,
            action: None,
            state: None,
            channels: None,
        }
    }

    /// Attaches the emitting context.
    #[inline]
    pub fn with_context(mut self, id: ContextId) -> Self {
        self.context = Some(id);
        self
    }

    /// Attaches a target id.
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an item count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a backoff multiplier.
    #[inline]
    pub fn with_multiplier(mut self, m: f64) -> Self {
        self.multiplier = Some(m);
        self
    }

    /// Attaches a leadership term.
    #[inline]
    pub fn with_term(mut self, term: u64) -> Self {
        self.term = Some(term);
        self
    }

    /// Attaches the context's role.
    #[inline]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Attaches a delivered action and the channels to show it on.
    #[inline]
    pub fn with_action(mut self, action: Arc<Action>, channels: NotificationChannels) -> Self {
        self.action = Some(action);
        self.channels = Some(channels);
        self
    }

    /// Attaches a view snapshot.
    #[inline]
    pub fn with_state(mut self, state: Arc<AggregateState>) -> Self {
        self.state = Some(state);
        self
    }

    /// True for events that change what the user sees.
    #[inline]
    pub fn is_presentation(&self) -> bool {
        matches!(self.kind, EventKind::ActionDelivered | EventKind::StateRendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ElectionStarted);
        let b = Event::new(EventKind::ElectionStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::PollScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_presentation_kinds() {
        assert!(Event::new(EventKind::StateRendered).is_presentation());
        assert!(!Event::new(EventKind::PollStarting).is_presentation());
    }
}
