//! # Shared bus between execution contexts.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] standing in for
//! the browser's same-origin broadcast channel. It is constructed once at
//! startup, handed to every context as an [`Endpoint`], and torn down
//! explicitly with [`Bus::close`].
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Consumers (many):
//!   Endpoint ctx-1 ──┐                   ┌──► Inbox ctx-1 (drops own envelopes)
//!   Endpoint ctx-2 ──┼──► Bus ───────────┼──► Inbox ctx-2
//!   Endpoint ctx-N ──┘  (broadcast chan) └──► Inbox ctx-N
//! ```
//!
//! ## Rules
//! - **Best effort**: `publish()` never blocks; with no live inbox the envelope is lost.
//! - **No echo**: an inbox never yields envelopes published by its own endpoint.
//! - **Lag handling**: a slow inbox skips the oldest envelopes and logs a warning.
//! - **Teardown**: after `close()` every inbox returns `None` and publishes are dropped.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::message::{ContextId, Envelope, Message};

/// Broadcast bus shared by all contexts of one origin.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or ordering guarantees across contexts.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Envelope>,
    closed: CancellationToken,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is **shared** across all inboxes (not per-context).
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Envelope>(capacity);
        Self {
            tx,
            closed: CancellationToken::new(),
        }
    }

    /// Creates an endpoint with a fresh [`ContextId`].
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            id: ContextId::next(),
            bus: self.clone(),
        }
    }

    /// Tears the bus down: pending and future `recv()` calls return `None`.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of live inboxes.
    pub fn receivers(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, envelope: Envelope) {
        if self.is_closed() {
            return;
        }
        let _ = self.tx.send(envelope);
    }
}

/// One context's handle on the [`Bus`].
#[derive(Clone, Debug)]
pub struct Endpoint {
    id: ContextId,
    bus: Bus,
}

impl Endpoint {
    /// Identity stamped on every envelope this endpoint publishes.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Publishes `message` with the sender's current `term`.
    pub fn publish(&self, message: Message, term: u64) {
        self.bus.send(Envelope {
            origin: self.id,
            term,
            message,
        });
    }

    /// Creates an inbox that observes envelopes sent **after** this call.
    pub fn subscribe(&self) -> Inbox {
        Inbox {
            id: self.id,
            rx: self.bus.tx.subscribe(),
            closed: self.bus.closed.clone(),
        }
    }

    /// The bus this endpoint belongs to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

/// Receiving side of an [`Endpoint`].
#[derive(Debug)]
pub struct Inbox {
    id: ContextId,
    rx: broadcast::Receiver<Envelope>,
    closed: CancellationToken,
}

impl Inbox {
    /// Waits for the next envelope from another context.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return None,
                next = self.rx.recv() => next,
            };
            match next {
                Ok(env) if env.origin == self.id => continue,
                Ok(env) => return Some(env),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(context = %self.id, skipped, "inbox lagged; envelopes dropped");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inbox_skips_own_envelopes() {
        let bus = Bus::new(16);
        let a = bus.endpoint();
        let b = bus.endpoint();
        let mut inbox_a = a.subscribe();
        let mut inbox_b = b.subscribe();

        a.publish(Message::LeaderCheck, 0);
        b.publish(Message::LeaderHere, 3);

        let got = inbox_a.recv().await.unwrap();
        assert_eq!(got.origin, b.id());
        assert_eq!(got.term, 3);
        assert_eq!(got.message, Message::LeaderHere);

        let got = inbox_b.recv().await.unwrap();
        assert_eq!(got.origin, a.id());
        assert_eq!(got.message, Message::LeaderCheck);
    }

    #[tokio::test]
    async fn test_close_ends_inboxes_and_drops_publishes() {
        let bus = Bus::new(16);
        let a = bus.endpoint();
        let b = bus.endpoint();
        let mut inbox = b.subscribe();

        bus.close();
        a.publish(Message::LeaderCheck, 0);
        assert!(bus.is_closed());
        assert!(inbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_inbox_keeps_newest() {
        let bus = Bus::new(2);
        let a = bus.endpoint();
        let b = bus.endpoint();
        let mut inbox = b.subscribe();

        for term in 0..5 {
            a.publish(Message::LeaderHere, term);
        }
        assert_eq!(inbox.recv().await.unwrap().term, 3);
        assert_eq!(inbox.recv().await.unwrap().term, 4);
    }

    #[test]
    fn test_endpoints_get_distinct_ids() {
        let bus = Bus::new(1);
        assert_ne!(bus.endpoint().id(), bus.endpoint().id());
    }
}
