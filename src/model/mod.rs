//! Data model: targets, actions, the dedup cache and the aggregate view.
//!
//! ## Contents
//! - [`Target`], [`Profile`]           a monitored account and its scheduling state
//! - [`Action`], [`ActionId`], [`ActionKind`] one notifiable event and its identity
//! - [`RecentlySeenSet`]               bounded FIFO of delivered ids
//! - [`AggregateState`]                full view exchanged by `data_update`
//! - [`NotificationChannels`]          overlay/system enable flags
//!
//! Ownership: each context owns its own [`AggregateState`]; nothing here is
//! shared by reference between contexts.

mod action;
mod channels;
mod recent;
mod state;
mod target;

pub use action::{Action, ActionId, ActionKind};
pub use channels::NotificationChannels;
pub use recent::RecentlySeenSet;
pub use state::AggregateState;
pub use target::{Profile, Target};
