//! Error types for runner operations.

use thiserror::Error;

/// Errors surfaced by a runner invocation.
///
/// Individual job failures are never reported here; they only feed the failure
/// count. A batch produces at most one of these errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// Configuration rejected before any job ran.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// More jobs failed than the configured tolerance allows.
    #[error("error stack overflow. Max acceptable count is {max_errors}")]
    ThresholdExceeded {
        /// Configured tolerance.
        max_errors: usize,
        /// Failures counted once the batch settled.
        failures: usize,
    },
    /// The runtime refused to start a job.
    #[error("failed to spawn job: {0}")]
    Spawn(String),
}

/// Application-facing result using anyhow for job-level failure detail.
pub type AppResult<T> = Result<T, anyhow::Error>;
