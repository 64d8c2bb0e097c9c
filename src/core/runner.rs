//! Blocking batch runner with bounded concurrency and failure tolerance.
//!
//! # Algorithm
//!
//! The calling thread walks the batch in submission order. For each job it takes a
//! gate slot, re-checks the failure count, and either dispatches the job onto its own
//! scoped OS thread or skips it. Once failures exceed `max_errors` every remaining job
//! is skipped, but jobs already in flight always run to completion.
//!
//! The outcome is decided only after the [`CompletionLatch`] reports that every job has
//! finished or been skipped, so a failure that is still being counted can never be
//! missed and no abort notification is ever sent to a party that is not listening.
//!
//! # Design Principles
//!
//! - **No polling**: slots and completion are both handed over through `Condvar`s
//! - **No leaks**: every job thread is scoped to the call and joined before it returns
//! - **Failures are data**: job errors and panics only bump the [`FailureCounter`]

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RunnerConfig;

use super::{
    AbortSignal, CompletionLatch, ConcurrencyGate, FailureCounter, Job, JobOutcome, RunnerError,
};

/// Tally of what happened to each job in a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Jobs submitted.
    pub total: usize,
    /// Jobs that were started.
    pub dispatched: usize,
    /// Dispatched jobs that succeeded.
    pub succeeded: usize,
    /// Dispatched jobs that failed or panicked.
    pub failed: usize,
    /// Jobs never started because the batch was aborting.
    pub skipped: usize,
}

/// Outcome counters for one batch, shared by the dispatcher and in-flight jobs.
#[derive(Debug, Default)]
pub(crate) struct OutcomeTally {
    failures: FailureCounter,
    succeeded: AtomicUsize,
    skipped: AtomicUsize,
}

impl OutcomeTally {
    /// Failures recorded so far.
    pub(crate) const fn failures(&self) -> &FailureCounter {
        &self.failures
    }

    /// Record the fate of job `index`.
    pub(crate) fn record(&self, index: usize, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Succeeded => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(job = index, "job succeeded");
            }
            JobOutcome::Failed => {
                let total = self.failures.record_failure();
                debug!(job = index, failures = total, "job failed");
            }
            JobOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                debug!(job = index, "job skipped");
            }
        }
    }

    /// Snapshot the counters once the batch has settled.
    pub(crate) fn report(&self, total: usize, dispatched: usize) -> RunReport {
        RunReport {
            total,
            dispatched,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failures.current_count(),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Runs batches of jobs under a [`RunnerConfig`].
///
/// A runner holds only its configuration; the gate, counter, and latch are created
/// fresh for every [`run`](Self::run) and torn down before it returns, so one runner
/// can serve any number of sequential or concurrent batches.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use prometheus_job_runner::{AppResult, JobRunner, RunnerConfig};
///
/// let done = AtomicUsize::new(0);
/// let job = || -> AppResult<()> {
///     done.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// };
///
/// let runner = JobRunner::new(RunnerConfig::new().with_max_concurrency(2)).unwrap();
/// let report = runner.run(&[&job, &job, &job]).unwrap();
///
/// assert_eq!(report.succeeded, 3);
/// assert_eq!(done.load(Ordering::SeqCst), 3);
/// ```
#[derive(Debug, Clone)]
pub struct JobRunner {
    config: RunnerConfig,
}

impl JobRunner {
    /// Create a runner after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::InvalidConfig` if `max_concurrency` is zero.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        config.validate().map_err(RunnerError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// The configuration this runner applies.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a batch to completion.
    ///
    /// Blocks until every dispatched job has finished. Jobs are considered in
    /// submission order; completion order is unspecified.
    ///
    /// # Errors
    ///
    /// - `RunnerError::ThresholdExceeded` if more than `max_errors` jobs failed
    /// - `RunnerError::Spawn` if a job thread could not be started; dispatch stops and
    ///   in-flight jobs are allowed to finish first
    pub fn run<J: Job>(&self, jobs: &[J]) -> Result<RunReport, RunnerError> {
        let max_errors = self.config.max_errors;
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "job_batch",
            %run_id,
            jobs = jobs.len(),
            max_concurrency = self.config.max_concurrency,
            max_errors
        );
        let _entered = span.enter();

        let gate = ConcurrencyGate::new(self.config.max_concurrency)?;
        let tally = OutcomeTally::default();
        let abort = AbortSignal::new();
        let latch = CompletionLatch::new(jobs.len());

        let mut dispatched = 0;
        let mut spawn_error: Option<String> = None;

        thread::scope(|scope| {
            let tally = &tally;
            let latch = &latch;

            for (index, job) in jobs.iter().enumerate() {
                if abort.is_tripped() || spawn_error.is_some() {
                    tally.record(index, JobOutcome::Skipped);
                    latch.count_down();
                    continue;
                }

                let permit = gate.acquire();

                // Checked after the slot is granted so failures of the job that freed it count.
                if tally.failures().exceeds(max_errors) {
                    if abort.trip() {
                        warn!(
                            failures = tally.failures().current_count(),
                            max_errors,
                            next_job = index,
                            "failure threshold exceeded, no further jobs will be dispatched"
                        );
                    }
                    drop(permit);
                    tally.record(index, JobOutcome::Skipped);
                    latch.count_down();
                    continue;
                }

                let job_span = span.clone();
                let spawned = thread::Builder::new()
                    .name(format!("job-runner-{index}"))
                    .spawn_scoped(scope, move || {
                        let _entered = job_span.enter();
                        tally.record(index, execute(index, job));
                        drop(permit);
                        latch.count_down();
                    });

                match spawned {
                    Ok(_) => {
                        dispatched += 1;
                        debug!(job = index, "job dispatched");
                    }
                    Err(e) => {
                        error!(job = index, error = %e, "failed to spawn job thread");
                        spawn_error = Some(e.to_string());
                        tally.record(index, JobOutcome::Skipped);
                        latch.count_down();
                    }
                }
            }

            latch.wait();
        });

        let report = tally.report(jobs.len(), dispatched);

        info!(
            dispatched = report.dispatched,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "job batch settled"
        );

        if report.failed > max_errors {
            return Err(RunnerError::ThresholdExceeded {
                max_errors,
                failures: report.failed,
            });
        }
        if let Some(msg) = spawn_error {
            return Err(RunnerError::Spawn(msg));
        }
        Ok(report)
    }
}

/// Run `jobs` with at most `max_concurrency` executing at once, failing the batch if
/// more than `max_errors` of them fail.
///
/// # Errors
///
/// - `RunnerError::InvalidConfig` if `max_concurrency` is zero; no job is run
/// - `RunnerError::ThresholdExceeded` if failures exceed `max_errors`
/// - `RunnerError::Spawn` if a job thread could not be started
pub fn handle<J: Job>(
    jobs: &[J],
    max_concurrency: usize,
    max_errors: usize,
) -> Result<(), RunnerError> {
    let config = RunnerConfig {
        max_concurrency,
        max_errors,
    };
    JobRunner::new(config)?.run(jobs).map(|_| ())
}

/// Invoke a job, turning errors and panics into a failed outcome.
fn execute<J: Job>(index: usize, job: &J) -> JobOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
        Ok(result) => {
            if let Err(e) = &result {
                warn!(job = index, error = %e, "job returned an error");
            }
            JobOutcome::from_result(&result)
        }
        Err(payload) => {
            warn!(job = index, panic = panic_message(&*payload), "job panicked");
            JobOutcome::Failed
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
