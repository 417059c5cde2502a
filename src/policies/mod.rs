//! Scheduling policies.
//!
//! This module groups the knobs that control **how long** a context waits
//! before acting again.
//!
//! ## Contents
//! - [`ActivityBackoff`] how a target's poll interval stretches with inactivity
//! - [`JitterPolicy`]    randomization to keep independent contexts out of lockstep
//!
//! ## Quick wiring
//! ```text
//! Config { base_interval, backoff: ActivityBackoff, poll_jitter: JitterPolicy, ... }
//!      └─► core::scheduler::Scheduler uses:
//!           - backoff.multiplier(since_last_seen, collapsed) after each fetch
//!           - poll_jitter.apply(base × multiplier) for the next poll time
//!      └─► core::context uses:
//!           - rejoin_jitter.apply(rejoin_delay) after a leader resigns
//! ```

mod backoff;
mod jitter;

pub use backoff::{ActivityBackoff, BackoffStep};
pub use jitter::JitterPolicy;
