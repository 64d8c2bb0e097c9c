//! Core runner abstractions: admission gate, failure accounting, and dispatch.

pub mod counter;
pub mod error;
pub mod gate;
pub mod job;
pub mod latch;
pub mod runner;
pub mod signal;

pub use counter::FailureCounter;
pub use error::{AppResult, RunnerError};
pub use gate::{ConcurrencyGate, GatePermit};
pub use job::{Job, JobOutcome};
pub use latch::CompletionLatch;
pub use runner::{handle, JobRunner, RunReport};
pub(crate) use runner::OutcomeTally;
pub use signal::AbortSignal;

use std::future::Future;

/// Abstraction for spawning job execution on an async runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
