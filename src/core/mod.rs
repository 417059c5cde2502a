//! Runtime core: election, scheduling, diffing and the per-context actor.
//!
//! The public entry point is [`ContextBuilder`], which spawns a context and
//! returns its [`ContextHandle`].
//!
//! Internal modules:
//! - [`election`]: pure leader-election state machine, emits directives;
//! - [`scheduler`]: per-target poll planning, adaptive intervals, result folding;
//! - [`diff`]: cursor-based dedup of a fetched page;
//! - [`runner`]: executes one poll job sequentially with a soft timeout;
//! - [`context`]: the actor loop tying the above to the bus, store and presenters.

mod builder;
mod context;
pub mod diff;
mod election;
mod runner;
mod scheduler;

#[cfg(test)]
pub(crate) mod testkit;

pub use builder::ContextBuilder;
pub use context::ContextHandle;
pub use election::{Directive, Election, Promotion, Role};
pub use runner::{JobKind, JobOutput, run_job};
pub use scheduler::{Applied, PollMode, PollPlan, PollReport, Scheduler};
