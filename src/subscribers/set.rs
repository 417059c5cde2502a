//! # PresenterSet: non-blocking fan-out over multiple presenters
//!
//! [`PresenterSet`] distributes each [`Event`] to multiple presenters
//! **without awaiting** their processing, so the context loop never waits on
//! rendering.
//!
//! ## What it guarantees
//! - `emit(Event)` returns immediately.
//! - Per-presenter FIFO (queue order).
//! - Panics inside presenters are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different presenters.
//! - No retries on per-presenter queue overflow (events are dropped for that presenter).
//!
//! ## Diagram
//! ```text
//!    emit(Event)
//!        │                        (Arc-clone per presenter)
//!        ├────────────────► [queue P1] ─► worker P1 ─► on_event()
//!        ├────────────────► [queue P2] ─► worker P2 ─► on_event()
//!        └────────────────► [queue PN] ─► worker PN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::Event;

use super::Presenter;

struct PresenterChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-presenter bounded queues and worker tasks.
pub struct PresenterSet {
    channels: Vec<PresenterChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl PresenterSet {
    /// Creates a new set and spawns one worker per presenter.
    ///
    /// Presenters without a preferred capacity get `default_capacity` (min 1).
    #[must_use]
    pub fn new(presenters: Vec<Arc<dyn Presenter>>, default_capacity: usize) -> Self {
        let mut channels = Vec::with_capacity(presenters.len());
        let mut workers = Vec::with_capacity(presenters.len());

        for presenter in presenters {
            let cap = presenter.queue_capacity().unwrap_or(default_capacity).max(1);
            let name = presenter.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let p = Arc::clone(&presenter);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = p.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        warn!(presenter = p.name(), seq = ev.seq, ?panic_err, "presenter panicked");
                    }
                }
            });

            channels.push(PresenterChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all presenters (non-blocking).
    ///
    /// If a presenter's queue is **full** or **closed**, the event is dropped for it
    /// and a warning is logged with the presenter's name.
    pub fn emit(&self, event: Event) {
        if self.channels.is_empty() {
            return;
        }
        let ev = Arc::new(event);
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(presenter = channel.name, kind = ?ev.kind, "presenter dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(presenter = channel.name, kind = ?ev.kind, "presenter dropped event: worker closed");
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no presenters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of presenters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Presenter for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Presenter for Exploder {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn test_fan_out_survives_panicking_presenter() {
        let rec = Arc::new(Recorder::default());
        let set = PresenterSet::new(vec![Arc::new(Exploder), rec.clone()], 8);
        assert_eq!(set.len(), 2);

        set.emit(Event::new(EventKind::TargetAdded));
        set.emit(Event::new(EventKind::TargetRemoved));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![EventKind::TargetAdded, EventKind::TargetRemoved]
        );
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let set = PresenterSet::new(Vec::new(), 8);
        assert!(set.is_empty());
        set.emit(Event::new(EventKind::ContextStopped));
        set.shutdown().await;
    }
}
