//! Async batch runner for jobs that are futures.
//!
//! Mirrors [`JobRunner`](crate::JobRunner): the dispatch loop walks the batch in order,
//! admission goes through a `tokio::sync::Semaphore`, and the batch outcome is decided
//! once every job has settled. Jobs are started through a [`Spawn`] implementation, so
//! the runner itself never assumes a particular executor.
//!
//! A job whose future panics (or is dropped by its runtime before finishing) is counted
//! as a failure by a drop guard, so the batch still settles.
//!
//! Every spawned job holds a receiver of a per-batch `watch` channel whose sender lives
//! in the `run` future. Dropping that future closes the channel and in-flight jobs are
//! cancelled at their next await point instead of outliving the call.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::core::{
    AbortSignal, AppResult, JobOutcome, OutcomeTally, RunReport, RunnerError, Spawn,
};

/// An async unit of work with a success/failure outcome.
///
/// Any `Fn() -> impl Future<Output = AppResult<()>>` closure that is `Send + Sync`
/// is an `AsyncJob`.
#[async_trait]
pub trait AsyncJob: Send + Sync + 'static {
    /// Execute the job.
    async fn run(&self) -> AppResult<()>;
}

#[async_trait]
impl<F, Fut> AsyncJob for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    async fn run(&self) -> AppResult<()> {
        self().await
    }
}

/// Count-down latch that async waiters can await.
struct AsyncLatch {
    remaining: AtomicUsize,
    settled: Notify,
}

impl AsyncLatch {
    fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            settled: Notify::new(),
        }
    }

    /// Saturates at zero like [`CompletionLatch`](crate::CompletionLatch).
    fn count_down(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            // notify_one stores a permit if the waiter has not parked yet.
            self.settled.notify_one();
        }
    }

    async fn wait(&self) {
        while self.remaining.load(Ordering::Acquire) > 0 {
            self.settled.notified().await;
        }
    }
}

/// State shared between the dispatch loop and in-flight jobs of one batch.
struct BatchState {
    tally: OutcomeTally,
    latch: AsyncLatch,
}

/// Settles one in-flight job exactly once, even if its future never completes.
struct InFlight {
    state: Arc<BatchState>,
    permit: Option<OwnedSemaphorePermit>,
    index: usize,
    outcome: Option<JobOutcome>,
}

impl InFlight {
    fn finish(mut self, outcome: JobOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or_else(|| {
            warn!(job = self.index, "job panicked or was cancelled before finishing");
            JobOutcome::Failed
        });
        self.state.tally.record(self.index, outcome);
        // Failure is visible before the slot is handed to the next job.
        drop(self.permit.take());
        self.state.latch.count_down();
    }
}

/// Runs batches of [`AsyncJob`]s through a [`Spawn`] implementation.
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_job_runner::runtime::{AsyncJobRunner, TokioSpawner};
/// use prometheus_job_runner::RunnerConfig;
///
/// let runner = AsyncJobRunner::new(
///     RunnerConfig::new().with_max_concurrency(4).with_max_errors(1),
///     TokioSpawner::current(),
/// )?;
/// let report = runner.run(jobs).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AsyncJobRunner<S> {
    config: RunnerConfig,
    spawner: S,
}

impl<S> AsyncJobRunner<S>
where
    S: Spawn,
{
    /// Create a runner after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::InvalidConfig` if `max_concurrency` is zero.
    pub fn new(config: RunnerConfig, spawner: S) -> Result<Self, RunnerError> {
        config.validate().map_err(RunnerError::InvalidConfig)?;
        Ok(Self { config, spawner })
    }

    /// The configuration this runner applies.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a batch to completion.
    ///
    /// Resolves only after every spawned job has settled.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future stops dispatch and cancels every in-flight job at
    /// its next await point. No job is started afterwards and none runs to completion
    /// on its own.
    ///
    /// # Errors
    ///
    /// - `RunnerError::ThresholdExceeded` if more than `max_errors` jobs failed
    /// - `RunnerError::Spawn` if admission became impossible mid-batch
    pub async fn run<J>(&self, jobs: Vec<Arc<J>>) -> Result<RunReport, RunnerError>
    where
        J: AsyncJob + ?Sized,
    {
        let span = tracing::info_span!(
            "async_job_batch",
            run_id = %Uuid::new_v4(),
            jobs = jobs.len(),
            max_concurrency = self.config.max_concurrency,
            max_errors = self.config.max_errors
        );
        self.run_batch(jobs).instrument(span).await
    }

    async fn run_batch<J>(&self, jobs: Vec<Arc<J>>) -> Result<RunReport, RunnerError>
    where
        J: AsyncJob + ?Sized,
    {
        let max_errors = self.config.max_errors;
        let total = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let abort = AbortSignal::new();
        let state = Arc::new(BatchState {
            tally: OutcomeTally::default(),
            latch: AsyncLatch::new(total),
        });
        // Closed when this future is dropped, which cancels in-flight jobs.
        let (_batch_alive, batch_closed) = watch::channel(());

        let mut dispatched = 0;
        let mut spawn_error: Option<String> = None;

        for (index, job) in jobs.into_iter().enumerate() {
            if abort.is_tripped() || spawn_error.is_some() {
                state.tally.record(index, JobOutcome::Skipped);
                state.latch.count_down();
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    spawn_error = Some(e.to_string());
                    state.tally.record(index, JobOutcome::Skipped);
                    state.latch.count_down();
                    continue;
                }
            };

            let failures = state.tally.failures();
            if failures.exceeds(max_errors) {
                if abort.trip() {
                    warn!(
                        failures = failures.current_count(),
                        max_errors,
                        next_job = index,
                        "failure threshold exceeded, no further jobs will be dispatched"
                    );
                }
                drop(permit);
                state.tally.record(index, JobOutcome::Skipped);
                state.latch.count_down();
                continue;
            }

            let guard = InFlight {
                state: Arc::clone(&state),
                permit: Some(permit),
                index,
                outcome: None,
            };
            let mut closed = batch_closed.clone();
            self.spawner.spawn(
                async move {
                    tokio::select! {
                        result = AsyncJob::run(&*job) => {
                            if let Err(e) = &result {
                                warn!(job = index, error = %e, "job returned an error");
                            }
                            guard.finish(JobOutcome::from_result(&result));
                        }
                        _ = closed.changed() => {
                            debug!(job = index, "batch dropped, cancelling job");
                        }
                    }
                }
                .instrument(tracing::Span::current()),
            );
            dispatched += 1;
            debug!(job = index, "job dispatched");
        }

        state.latch.wait().await;

        let report = state.tally.report(total, dispatched);

        info!(
            dispatched = report.dispatched,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "async job batch settled"
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
