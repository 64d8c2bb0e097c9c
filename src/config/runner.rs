//! Runner configuration.

use std::io;

use serde::{Deserialize, Serialize};

/// Environment variable holding the concurrency cap.
pub const ENV_MAX_CONCURRENCY: &str = "JOB_RUNNER_MAX_CONCURRENCY";
/// Environment variable holding the failure tolerance.
pub const ENV_MAX_ERRORS: &str = "JOB_RUNNER_MAX_ERRORS";

/// Limits applied to a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum jobs executing at the same time. Must be at least 1.
    pub max_concurrency: usize,
    /// Failures tolerated before the batch aborts. The batch aborts once
    /// failures are strictly greater than this value.
    pub max_errors: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get(),
            max_errors: 0,
        }
    }
}

impl RunnerConfig {
    /// Create a configuration with defaults (one slot per logical CPU, zero tolerance).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency cap.
    #[must_use]
    pub const fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the failure tolerance.
    #[must_use]
    pub const fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present. Variables
    /// that are unset keep their defaults. A `.env` file that exists but cannot be
    /// read or parsed is an error.
    pub fn from_env() -> Result<Self, String> {
        check_dotenv(dotenvy::dotenv().map(drop))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            cfg.max_concurrency = parse_count(ENV_MAX_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ERRORS) {
            cfg.max_errors = parse_count(ENV_MAX_ERRORS, &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn check_dotenv(loaded: Result<(), dotenvy::Error>) -> Result<(), String> {
    match loaded {
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!(".env error: {e}")),
        Ok(()) => Ok(()),
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("`{key}` must be a non-negative integer: {e}"))
}
