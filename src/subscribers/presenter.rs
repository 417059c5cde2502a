//! # Presentation sink trait.
//!
//! Provides [`Presenter`], the extension point through which a context hands
//! its output to the outside world: toasts for delivered actions, a re-render
//! for every new view, and anything else worth logging.
//!
//! Each presenter gets:
//! - **Dedicated worker task** (runs independently of the context loop)
//! - **Per-presenter bounded queue** (capacity via [`Presenter::queue_capacity`])
//! - **Panic isolation** (panics are caught and logged)
//!
//! ## Rules
//! - A slow presenter only affects its own queue.
//! - Queue overflow drops the event **for this presenter only**.
//! - Events are processed sequentially (FIFO) per presenter.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use seekvisor::{Event, EventKind, Presenter};
//!
//! struct Toasts;
//!
//! #[async_trait]
//! impl Presenter for Toasts {
//!     async fn on_event(&self, ev: &Event) {
//!         if let (EventKind::ActionDelivered, Some(action)) = (ev.kind, &ev.action) {
//!             let _ = action.link();
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "toasts" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Consumer of context events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Presenter: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, never from the context loop.
    async fn on_event(&self, event: &Event);

    /// Name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity; `None` uses `Config::presenter_queue`.
    fn queue_capacity(&self) -> Option<usize> {
        None
    }
}
