//! Tests for engine configuration loading

use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;
use velocore::velocore::config::{
    ENV_COUNT_DISTINCT_ENTRIES, ENV_GROUP_ENTRIES, ENV_NULL_POLICY, EngineConfig, NullPolicy,
};

fn clear_env() {
    // SAFETY: tests touching the environment are serialized with #[serial].
    unsafe {
        std::env::remove_var(ENV_NULL_POLICY);
        std::env::remove_var(ENV_COUNT_DISTINCT_ENTRIES);
        std::env::remove_var(ENV_GROUP_ENTRIES);
    }
}

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.null_policy, NullPolicy::Skip);
    assert_eq!(config.count_distinct_entries, 16384);
    assert_eq!(config.group_entries, 512);
    assert_eq!(config.max_result_records, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "null_policy: fail_fast\ncount_distinct_entries: 1024\nmax_result_records: 25"
    )
    .unwrap();

    let config = EngineConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.null_policy, NullPolicy::FailFast);
    assert_eq!(config.count_distinct_entries, 1024);
    assert_eq!(config.group_entries, 512);
    assert_eq!(config.max_result_records, 25);
}

#[test]
fn test_missing_file_is_configuration_error() {
    let err = EngineConfig::from_yaml_file("/nonexistent/velocore.yaml").unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_entries_below_minimum_rejected() {
    let err = EngineConfig::from_yaml_str("count_distinct_entries: 8\n").unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
#[serial]
fn test_env_overrides_apply() {
    clear_env();
    // SAFETY: serialized with other environment tests.
    unsafe {
        std::env::set_var(ENV_NULL_POLICY, "fail_fast");
        std::env::set_var(ENV_GROUP_ENTRIES, "64");
    }
    let config = EngineConfig::default().with_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.null_policy, NullPolicy::FailFast);
    assert_eq!(config.group_entries, 64);
    assert_eq!(config.count_distinct_entries, 16384);
}

#[test]
#[serial]
fn test_invalid_env_override_rejected() {
    clear_env();
    // SAFETY: serialized with other environment tests.
    unsafe {
        std::env::set_var(ENV_COUNT_DISTINCT_ENTRIES, "lots");
    }
    let result = EngineConfig::default().with_env_overrides();
    clear_env();
    assert!(result.unwrap_err().is_configuration_error());

    unsafe {
        std::env::set_var(ENV_NULL_POLICY, "sometimes");
    }
    let result = EngineConfig::default().with_env_overrides();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_no_env_leaves_config_unchanged() {
    clear_env();
    let config = EngineConfig::from_yaml_str("group_entries: 32\n")
        .unwrap()
        .with_env_overrides()
        .unwrap();
    assert_eq!(config.group_entries, 32);
}
