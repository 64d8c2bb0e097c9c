//! Tests for configuration validation

use prometheus_job_runner::config::RunnerConfig;

#[test]
fn test_runner_config_validation() {
    let valid = RunnerConfig {
        max_concurrency: 4,
        max_errors: 0,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_runner_config_invalid_concurrency() {
    let invalid = RunnerConfig {
        max_concurrency: 0,
        max_errors: 3,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_runner_config_defaults() {
    let cfg = RunnerConfig::default();
    assert!(cfg.max_concurrency >= 1);
    assert_eq!(cfg.max_errors, 0);
}

#[test]
fn test_runner_config_builder() {
    let cfg = RunnerConfig::new().with_max_concurrency(8).with_max_errors(2);
    assert_eq!(cfg.max_concurrency, 8);
    assert_eq!(cfg.max_errors, 2);
}

#[test]
fn test_runner_config_from_json() {
    let json = r#"{
        "max_concurrency": 16,
        "max_errors": 5
    }"#;

    let cfg = RunnerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.max_concurrency, 16);
    assert_eq!(cfg.max_errors, 5);
}

#[test]
fn test_runner_config_from_json_partial_uses_defaults() {
    let cfg = RunnerConfig::from_json_str(r#"{ "max_concurrency": 2 }"#).unwrap();
    assert_eq!(cfg.max_concurrency, 2);
    assert_eq!(cfg.max_errors, 0);
}

#[test]
fn test_runner_config_from_json_rejects_zero_concurrency() {
    let err = RunnerConfig::from_json_str(r#"{ "max_concurrency": 0 }"#).unwrap_err();
    assert_eq!(err, "max_concurrency must be greater than 0");
}

#[test]
fn test_runner_config_from_json_rejects_negative() {
    let err = RunnerConfig::from_json_str(r#"{ "max_errors": -1 }"#).unwrap_err();
    assert!(err.starts_with("parse error"));
}
