//! Integration tests for the AsyncJobRunner
//!
//! Exercises the async runner against a real multi-threaded Tokio runtime.

use async_trait::async_trait;
use prometheus_job_runner::runtime::{AsyncJob, AsyncJobRunner, TokioSpawner};
use prometheus_job_runner::{AppResult, RunnerConfig, RunnerError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// TEST JOBS
// ============================================================================

#[derive(Default)]
struct Tracker {
    invoked: AtomicUsize,
    succeeded: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Async job that records execution, sleeps, then fails or succeeds.
struct SleepyJob {
    tracker: Arc<Tracker>,
    fail: bool,
    pause: Duration,
}

#[async_trait]
impl AsyncJob for SleepyJob {
    async fn run(&self) -> AppResult<()> {
        self.tracker.invoked.fetch_add(1, Ordering::SeqCst);
        let now = self.tracker.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.tracker.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.pause).await;

        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("async job failed");
        }
        self.tracker.succeeded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn batch(tracker: &Arc<Tracker>, pattern: &[bool], pause: Duration) -> Vec<Arc<SleepyJob>> {
    pattern
        .iter()
        .map(|&fail| {
            Arc::new(SleepyJob {
                tracker: Arc::clone(tracker),
                fail,
                pause,
            })
        })
        .collect()
}

fn runner(max_concurrency: usize, max_errors: usize) -> AsyncJobRunner<TokioSpawner> {
    AsyncJobRunner::new(
        RunnerConfig::new()
            .with_max_concurrency(max_concurrency)
            .with_max_errors(max_errors),
        TokioSpawner::current(),
    )
    .unwrap()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_all_succeed() {
    let tracker = Arc::new(Tracker::default());
    let jobs = batch(&tracker, &[false, false, false], Duration::from_millis(1));

    let report = runner(1, 0).run(jobs).await.unwrap();
    assert_eq!(report.succeeded, 3);
    assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_failures_within_tolerance() {
    let tracker = Arc::new(Tracker::default());
    let jobs = batch(&tracker, &[true, true, false], Duration::from_millis(1));

    let report = runner(3, 2).run(jobs).await.unwrap();
    assert_eq!(report.failed, 2);
    assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_threshold_exceeded() {
    let tracker = Arc::new(Tracker::default());
    let jobs = batch(
        &tracker,
        &[false, true, false, true, true],
        Duration::from_millis(1),
    );

    let err = runner(2, 2).run(jobs).await.unwrap_err();
    assert_eq!(
        err,
        RunnerError::ThresholdExceeded {
            max_errors: 2,
            failures: 3
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_cap_and_prompt_abort() {
    let tracker = Arc::new(Tracker::default());
    let jobs = batch(&tracker, &[true; 20], Duration::from_millis(10));

    let err = runner(3, 0).run(jobs).await.unwrap_err();
    assert!(matches!(err, RunnerError::ThresholdExceeded { max_errors: 0, .. }));
    assert!(tracker.invoked.load(Ordering::SeqCst) <= 3);
    assert!(tracker.peak.load(Ordering::SeqCst) <= 3);
    // Every dispatched job settled before the runner returned.
    assert_eq!(tracker.active.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_empty_batch() {
    let report = runner(2, 0)
        .run(Vec::<Arc<SleepyJob>>::new())
        .await
        .unwrap();
    assert_eq!(report.total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_closures_as_jobs() {
    let hits = Arc::new(AtomicUsize::new(0));
    let jobs: Vec<Arc<dyn AsyncJob>> = (0..5)
        .map(|_| {
            let hits = Arc::clone(&hits);
            Arc::new(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), anyhow::Error>(())
                }
            }) as Arc<dyn AsyncJob>
        })
        .collect();

    runner(2, 0).run(jobs).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_run_cancels_in_flight_jobs() {
    let tracker = Arc::new(Tracker::default());
    let jobs = batch(&tracker, &[false; 4], Duration::from_millis(100));
    let runner = runner(2, 0);

    let outcome = tokio::time::timeout(Duration::from_millis(20), runner.run(jobs)).await;
    assert!(outcome.is_err(), "batch should still be running at the deadline");
    assert_eq!(tracker.invoked.load(Ordering::SeqCst), 2);

    // Long enough for the started jobs to have finished had they been left running.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(tracker.invoked.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 0);
}
