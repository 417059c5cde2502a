//! # seekvisor
//!
//! **Seekvisor** watches a handful of forum accounts from several execution
//! contexts (browser tabs, processes sharing a bus) at once, while only one of
//! them ever talks to the remote service.
//!
//! Contexts elect a leader over a broadcast [`Bus`]. The leader polls each
//! monitored account on an adaptive schedule, diffs the fetched page against a
//! persisted cursor, delivers genuinely new actions (staggered) and replicates
//! its full state to every follower. Followers render what they are sent and
//! forward user commands to the leader.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TabContext  │   │  TabContext  │   │  TabContext  │
//!     │   (leader)   │   │  (follower)  │   │  (follower)  │
//!     └──┬───────▲───┘   └──┬───────▲───┘   └──┬───────▲───┘
//!        │       │          │       │          │       │
//!        ▼       │          ▼       │          ▼       │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                 Bus (broadcast, no self-echo)                     │
//! │  leader_check / leader_here / leader_takeover / leader_resign     │
//! │  data_request / data_update / new_action / cmd_*                  │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!  leader only:
//!     ticker ─► Scheduler ─► run_job ─► Fetcher (remote)
//!                                │
//!                                ▼
//!                     diff::advance (cursor + RecentlySeenSet)
//!                                │
//!           ┌────────────────────┼─────────────────────┐
//!           ▼                    ▼                     ▼
//!     DelayQueue            data_update           ConfigStore
//!   (staggered delivery)   (full state)       (cursors, targets)
//!
//!  every context:
//!     Event ─► PresenterSet ─► per-presenter queue ─► Presenter::on_event()
//! ```
//!
//! ### Poll lifecycle
//! ```text
//! tick (leader, nothing in flight)
//!   ├─► first target with next_poll_at <= now
//!   ├─► profile fetch
//!   │     └─ unchanged last_seen_at and a cached page ─► PollSkipped
//!   ├─► action page fetch (newest first)
//!   ├─► diff against cursor
//!   │     ├─ no cursor        ─► baseline, nothing delivered
//!   │     ├─ cursor on page   ─► actions above it are new
//!   │     └─ cursor lost      ─► whole page, filtered by RecentlySeenSet
//!   ├─► multiplier from last activity (1× .. 20×, 2× when collapsed)
//!   └─► next_poll_at = now + base × multiplier + jitter
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Contexts**      | Spawn and drive one execution context.                   | [`ContextBuilder`], [`ContextHandle`]       |
//! | **Election**      | Pure leader-election state machine.                      | [`Election`], [`Role`], [`Directive`]       |
//! | **Scheduling**    | Adaptive per-target poll planning.                       | [`Scheduler`], [`ActivityBackoff`]          |
//! | **Diffing**       | Cursor-based dedup of fetched pages.                     | [`advance`], [`RecentlySeenSet`]            |
//! | **Remote**        | Fetch seam and the HTTP implementation.                  | [`Fetcher`], `HttpFetcher`                  |
//! | **Persistence**   | Durable config and the settings collaborator.            | [`ConfigStore`], [`Settings`]               |
//! | **Presentation**  | Hook into lifecycle and delivery events.                 | [`Presenter`], [`Event`]                    |
//! | **Errors**        | Typed errors for fetches, storage and handles.           | [`FetchError`], [`StoreError`]              |
//! | **Configuration** | Centralize tuning knobs.                                 | [`Config`]                                  |
//!
//! ## Optional features
//! - `http` _(default)_: [`HttpFetcher`](remote::HttpFetcher) built on `reqwest`.
//! - `logging`: exports a built-in [`LogWriter`] presenter that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use seekvisor::{Action, Bus, ContextBuilder, FetchError, Fetcher, Profile, Role};
//!
//! struct Quiet;
//!
//! #[async_trait]
//! impl Fetcher for Quiet {
//!     async fn profile(&self, _target: &str) -> Result<Profile, FetchError> {
//!         Ok(Profile::default())
//!     }
//!     async fn actions(&self, _target: &str) -> Result<Vec<Action>, FetchError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::new(64);
//!     let tab = ContextBuilder::new(&bus, Arc::new(Quiet)).spawn();
//!
//!     tab.wait_role(Role::Leader).await?;
//!     tab.add_target("alice").await?;
//!     tab.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod clock;
mod config;
mod core;
mod error;
mod events;
mod model;
mod policies;
pub mod remote;
pub mod store;
mod subscribers;
pub mod transport;

// ---- Public re-exports ----

pub use clock::Clock;
pub use config::Config;
pub use core::diff::{Advance, advance, newer_than};
pub use core::{
    Applied, ContextBuilder, ContextHandle, Directive, Election, JobKind, JobOutput, PollMode,
    PollPlan, PollReport, Promotion, Role, Scheduler, run_job,
};
pub use error::{ContextError, FetchError, SettingsError, StoreError};
pub use events::{Event, EventKind};
pub use model::{
    Action, ActionId, ActionKind, AggregateState, NotificationChannels, Profile, RecentlySeenSet,
    Target,
};
pub use policies::{ActivityBackoff, BackoffStep, JitterPolicy};
pub use remote::{FetchOutcome, Fetcher, PollProbe};
pub use store::{ConfigPatch, ConfigStore, Settings, SettingsSnapshot, StoredConfig};
pub use subscribers::{Presenter, PresenterSet};
pub use transport::{Bus, ConfigKey, ContextId, Envelope, Message};

// Optional: expose a built-in presenter that logs through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
