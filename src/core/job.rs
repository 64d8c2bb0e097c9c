//! Job abstraction and per-job outcomes.

use serde::{Deserialize, Serialize};

use super::AppResult;

/// A unit of work with a success/failure outcome and no payload.
///
/// The runner only borrows jobs and invokes each at most once. The error carried by a
/// failed job is logged but never propagated; the runner only needs to know that it failed.
///
/// Any `Fn() -> AppResult<()>` closure that is `Send + Sync` is a `Job`.
///
/// # Example
///
/// ```
/// use prometheus_job_runner::{AppResult, Job};
///
/// struct Ping;
///
/// impl Job for Ping {
///     fn run(&self) -> AppResult<()> {
///         Ok(())
///     }
/// }
///
/// assert!(Ping.run().is_ok());
/// assert!((|| -> AppResult<()> { anyhow::bail!("down") }).run().is_err());
/// ```
pub trait Job: Send + Sync {
    /// Execute the job.
    fn run(&self) -> AppResult<()>;
}

impl<F> Job for F
where
    F: Fn() -> AppResult<()> + Send + Sync,
{
    fn run(&self) -> AppResult<()> {
        self()
    }
}

/// What happened to a single job within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job ran and succeeded.
    Succeeded,
    /// The job ran and failed (including panics).
    Failed,
    /// The job was never invoked because the batch was aborting.
    Skipped,
}

impl JobOutcome {
    /// Map a job's result to its outcome.
    #[must_use]
    pub fn from_result(result: &AppResult<()>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(_) => Self::Failed,
        }
    }
}
