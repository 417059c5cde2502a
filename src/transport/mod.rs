//! Cross-context transport: wire schema and broadcast bus.
//!
//! ## Contents
//! - [`Message`], [`Envelope`], [`ContextId`], [`ConfigKey`] the tagged union on the bus
//! - [`Bus`], [`Endpoint`], [`Inbox`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: every context, through its own [`Endpoint`].
//! - **Consumers**: every context's run loop, through its own [`Inbox`].
//!
//! See `core/mod.rs` for how contexts react to each message.

mod bus;
mod message;

pub use bus::{Bus, Endpoint, Inbox};
pub use message::{ConfigKey, ContextId, Envelope, Message};
