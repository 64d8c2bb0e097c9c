//! Runtime adapters (Tokio) and the async runner.

pub mod async_runner;
pub mod tokio_spawner;

pub use async_runner::{AsyncJob, AsyncJobRunner};
pub use tokio_spawner::TokioSpawner;
