//! # Prometheus Job Runner
//!
//! A bounded-concurrency batch runner for independent units of work.
//!
//! Given a batch of jobs, the runner executes them with a hard cap on how many run at
//! the same time, counts how many fail, and stops dispatching new work once failures
//! exceed a configured tolerance. Jobs that are already running when the threshold is
//! crossed are always allowed to finish; the runner never returns while any dispatched
//! job is still executing.
//!
//! ## Building Blocks
//!
//! - **[`ConcurrencyGate`]**: Counting gate bounding simultaneous job execution
//! - **[`FailureCounter`]**: Atomic failure tally shared by all running jobs
//! - **[`AbortSignal`]**: Single-assignment flag raised when tolerance is exceeded
//! - **[`CompletionLatch`]**: Condvar-based latch released when every job is accounted for
//! - **[`JobRunner`]**: The blocking entry point tying the above together
//!
//! ## Blocking API
//!
//! ```
//! use prometheus_job_runner::{handle, RunnerError};
//!
//! fn ok() -> anyhow::Result<()> {
//!     Ok(())
//! }
//!
//! fn boom() -> anyhow::Result<()> {
//!     anyhow::bail!("boom")
//! }
//!
//! // Two jobs, one at a time, no failures tolerated.
//! handle(&[ok, ok], 1, 0).unwrap();
//!
//! let err = handle(&[boom], 1, 0).unwrap_err();
//! assert!(matches!(err, RunnerError::ThresholdExceeded { max_errors: 0, .. }));
//! ```
//!
//! ## Async API
//!
//! With the default `tokio-runtime` feature, [`runtime::AsyncJobRunner`] provides the same
//! semantics for async jobs, spawning through the [`core::Spawn`] abstraction.
//!
//! For complete examples, see:
//! - `tests/runner_test.rs` - Blocking runner integration tests
//! - `tests/async_runner_test.rs` - Async runner integration tests

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core runner abstractions: gate, counter, signals, and the blocking runner.
pub mod core;
/// Configuration models for the runner.
pub mod config;
/// Runtime adapters (Tokio) and the async runner.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::config::RunnerConfig;
pub use crate::core::{
    handle, AbortSignal, AppResult, CompletionLatch, ConcurrencyGate, FailureCounter, GatePermit,
    Job, JobOutcome, JobRunner, RunReport, RunnerError,
};
