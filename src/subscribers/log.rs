//! # LogWriter: event printer
//!
//! A minimal presenter that forwards incoming [`Event`]s to `tracing`.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO [promoted] context=ctx-1 term=1 via="window_elapsed"
//! INFO [poll] context=ctx-1 target="alice" via="tick"
//! INFO [scheduled] context=ctx-1 target="alice" delay_ms=64210 multiplier=1.0
//! INFO [delivered] context=ctx-2 target="alice" action="512_3"
//! WARN [poll-failed] context=ctx-1 target="bob" err="fetch failed: status 502"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Presenter;

/// Event writer presenter.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Presenter for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ctx = e.context.map(|c| c.to_string()).unwrap_or_default();
        match e.kind {
            EventKind::ElectionStarted => {
                debug!("[election] context={ctx} term={:?}", e.term);
            }
            EventKind::Promoted => {
                info!("[promoted] context={ctx} term={:?} via={:?}", e.term, e.reason);
            }
            EventKind::Demoted => {
                info!("[demoted] context={ctx} winner_term={:?}", e.term);
            }
            EventKind::PollStarting => {
                info!("[poll] context={ctx} target={:?} via={:?}", e.target, e.reason);
            }
            EventKind::PollSkipped => {
                debug!("[poll-skipped] context={ctx} target={:?}", e.target);
            }
            EventKind::PollFailed => {
                warn!("[poll-failed] context={ctx} target={:?} err={:?}", e.target, e.reason);
            }
            EventKind::PollScheduled => {
                info!(
                    "[scheduled] context={ctx} target={:?} delay_ms={:?} multiplier={:?}",
                    e.target, e.delay_ms, e.multiplier
                );
            }
            EventKind::ActionsDiscovered => {
                info!("[discovered] context={ctx} target={:?} count={:?}", e.target, e.count);
            }
            EventKind::ActionDelivered => {
                let id = e.action.as_ref().map(|a| a.id.to_string());
                info!("[delivered] context={ctx} target={:?} action={:?}", e.target, id);
            }
            EventKind::StateRendered => {
                let targets = e.state.as_ref().map(|s| s.targets.len());
                debug!("[render] context={ctx} role={:?} targets={:?}", e.role, targets);
            }
            EventKind::TargetAdded => {
                info!("[added] context={ctx} target={:?}", e.target);
            }
            EventKind::TargetRemoved => {
                info!("[removed] context={ctx} target={:?}", e.target);
            }
            EventKind::CommandRejected => {
                warn!("[rejected] context={ctx} target={:?} reason={:?}", e.target, e.reason);
            }
            EventKind::PersistFailed => {
                warn!("[persist-failed] context={ctx} err={:?}", e.reason);
            }
            EventKind::ContextStopped => {
                info!("[stopped] context={ctx}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
