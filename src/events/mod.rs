//! # Context events.
//!
//! Every execution context reports what it does as typed [`Event`]s. They are
//! fanned out to the context's presenters (see [`crate::subscribers`]); the
//! presentation sink is just a presenter that reacts to
//! [`EventKind::ActionDelivered`] and [`EventKind::StateRendered`].
//!
//! ```text
//! TabContext ── emit(Event) ──► PresenterSet ──► presenter.on_event()
//! ```

mod event;

pub use event::{Event, EventKind};
