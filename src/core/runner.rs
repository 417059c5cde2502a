//! # Run one poll job against the remote fetcher.
//!
//! A job is a batch of [`PollPlan`]s executed **sequentially** (never all
//! targets at once), each wrapped in the configured soft timeout.
//!
//! ```text
//! Tick / Refresh / Admit:  [plan]            ─► fetch_target ─► PollReport
//! PollAll:                 [plan, plan, ...] ─► fetch_target ─► PollReport, ...
//!
//! timeout exceeded ─► FetchError::Timeout (the fetch future is dropped)
//! ```
//!
//! ## Rules
//! - Always yields **exactly one** report per plan, in plan order.
//! - The runner never touches context state; reports are applied after the
//!   whole job completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use super::scheduler::{PollPlan, PollReport};
use crate::error::FetchError;
use crate::remote::{FetchOutcome, Fetcher, fetch_target};

/// What triggered a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Scheduler tick: the first due target.
    Tick,
    /// Poll every target once (manual refresh or fresh leadership).
    PollAll,
    /// Poll one target now.
    Refresh,
    /// Validate and baseline a newly requested target.
    Admit,
}

impl JobKind {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobKind::Tick => "tick",
            JobKind::PollAll => "poll_all",
            JobKind::Refresh => "refresh",
            JobKind::Admit => "admit",
        }
    }
}

/// Finished job.
#[derive(Debug)]
pub struct JobOutput {
    /// Trigger.
    pub kind: JobKind,
    /// One report per plan, in plan order.
    pub reports: Vec<PollReport>,
}

/// Executes `plans` one after another.
pub async fn run_job(
    fetcher: Arc<dyn Fetcher>,
    kind: JobKind,
    plans: Vec<PollPlan>,
    timeout: Option<Duration>,
) -> JobOutput {
    let mut reports = Vec::with_capacity(plans.len());
    for plan in plans {
        let result = run_once(fetcher.as_ref(), &plan, timeout).await;
        debug!(job = kind.as_label(), user = %plan.target, ok = result.is_ok(), "poll finished");
        reports.push(PollReport {
            target: plan.target,
            mode: plan.mode,
            result,
        });
    }
    JobOutput { kind, reports }
}

async fn run_once(
    fetcher: &dyn Fetcher,
    plan: &PollPlan,
    timeout: Option<Duration>,
) -> Result<FetchOutcome, FetchError> {
    let fut = fetch_target(fetcher, &plan.target, &plan.probe);
    match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(res) => res,
            Err(_elapsed) => Err(FetchError::Timeout { timeout: dur }),
        },
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::PollMode;
    use crate::model::{Action, Profile};
    use crate::remote::PollProbe;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl Fetcher for Slow {
        async fn profile(&self, target: &str) -> Result<Profile, FetchError> {
            if target == "slow" {
                time::sleep(Duration::from_secs(60)).await;
            }
            Ok(Profile::default())
        }

        async fn actions(&self, _target: &str) -> Result<Vec<Action>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn plan(target: &str) -> PollPlan {
        PollPlan {
            target: target.into(),
            probe: PollProbe { initial: true, ..PollProbe::default() },
            mode: PollMode::Baseline,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_fetch_error_and_batch_continues() {
        let out = run_job(
            Arc::new(Slow),
            JobKind::PollAll,
            vec![plan("slow"), plan("fast")],
            Some(Duration::from_secs(15)),
        )
        .await;

        assert_eq!(out.kind, JobKind::PollAll);
        assert_eq!(out.reports.len(), 2);
        assert_eq!(
            out.reports[0].result.as_ref().unwrap_err(),
            &FetchError::Timeout { timeout: Duration::from_secs(15) }
        );
        assert!(matches!(out.reports[1].result, Ok(FetchOutcome::Fetched { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_means_none() {
        let out = run_job(Arc::new(Slow), JobKind::Tick, vec![plan("slow")], Some(Duration::ZERO)).await;
        assert!(out.reports[0].result.is_ok());
    }
}
