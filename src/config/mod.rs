//! Configuration models for the runner.

pub mod runner;

pub use runner::{RunnerConfig, ENV_MAX_CONCURRENCY, ENV_MAX_ERRORS};
