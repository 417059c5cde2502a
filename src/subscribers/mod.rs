//! # Presenters: the presentation sink seam.
//!
//! This module provides the [`Presenter`] trait, the [`PresenterSet`] fan-out
//! and the built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   TabContext ── emit(Event) ──► PresenterSet ──┬──► [queue] ─► Overlay / toasts
//!                                                ├──► [queue] ─► LogWriter
//!                                                └──► [queue] ─► Custom ...
//! ```
//!
//! ## Presenter types
//! - **Sinks**: react to `ActionDelivered` / `StateRendered` (UI, OS notifications)
//! - **Observers**: look at everything (logging, test recorders)

#[cfg(feature = "logging")]
mod log;
mod presenter;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use presenter::Presenter;
pub use set::PresenterSet;
