//! Tests for error types

use prometheus_job_runner::core::RunnerError;

#[test]
fn test_threshold_exceeded_error() {
    let err = RunnerError::ThresholdExceeded {
        max_errors: 3,
        failures: 4,
    };
    assert_eq!(
        format!("{}", err),
        "error stack overflow. Max acceptable count is 3"
    );
}

#[test]
fn test_invalid_config_error() {
    let err = RunnerError::InvalidConfig("max_concurrency must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_concurrency must be greater than 0"
    );
}

#[test]
fn test_spawn_error() {
    let err = RunnerError::Spawn("Resource temporarily unavailable".to_string());
    assert_eq!(
        format!("{}", err),
        "failed to spawn job: Resource temporarily unavailable"
    );
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    assert_error(&RunnerError::Spawn("x".into()));
}
