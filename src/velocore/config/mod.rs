//! Engine configuration
//!
//! Configuration is plain data loaded from YAML, with a small set of
//! environment variable overrides applied on top:
//!
//! ```yaml
//! null_policy: fail_fast
//! count_distinct_entries: 4096
//! group_entries: 512
//! max_result_records: 100
//! ```
//!
//! | Variable | Field |
//! |---|---|
//! | `VELOCORE_NULL_POLICY` | `null_policy` (`skip` or `fail_fast`) |
//! | `VELOCORE_COUNT_DISTINCT_ENTRIES` | `count_distinct_entries` |
//! | `VELOCORE_GROUP_ENTRIES` | `group_entries` |

use crate::velocore::sql::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const ENV_NULL_POLICY: &str = "VELOCORE_NULL_POLICY";
pub const ENV_COUNT_DISTINCT_ENTRIES: &str = "VELOCORE_COUNT_DISTINCT_ENTRIES";
pub const ENV_GROUP_ENTRIES: &str = "VELOCORE_GROUP_ENTRIES";

/// Smallest sketch capacity accepted by [`EngineConfig::validate`].
pub const MIN_SKETCH_ENTRIES: usize = 16;

/// What an aggregation does with a NULL (or absent) field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// The value contributes nothing to the metric.
    #[default]
    Skip,
    /// The record is rejected with an execution error.
    FailFast,
}

impl FromStr for NullPolicy {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(NullPolicy::Skip),
            "fail_fast" | "fail-fast" | "failfast" => Ok(NullPolicy::FailFast),
            other => Err(SqlError::configuration_error(format!(
                "Unknown null policy '{}', expected 'skip' or 'fail_fast'",
                other
            ))),
        }
    }
}

/// Configuration shared by every query built on the execution core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub null_policy: NullPolicy,
    /// Maximum retained entries of a COUNT DISTINCT sketch.
    pub count_distinct_entries: usize,
    /// Maximum retained groups of a GROUP BY sketch.
    pub group_entries: usize,
    /// Cap on records returned by a finished query. Zero means unlimited.
    pub max_result_records: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            null_policy: NullPolicy::Skip,
            count_distinct_entries: 16384,
            group_entries: 512,
            max_result_records: 0,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> SqlResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml).map_err(|e| {
            SqlError::configuration_error(format!("Invalid engine configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> SqlResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SqlError::configuration_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loading engine configuration from {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Apply `VELOCORE_*` environment variables on top of this configuration.
    pub fn with_env_overrides(mut self) -> SqlResult<Self> {
        if let Ok(value) = std::env::var(ENV_NULL_POLICY) {
            self.null_policy = value.parse()?;
        }
        if let Some(entries) = env_usize(ENV_COUNT_DISTINCT_ENTRIES)? {
            self.count_distinct_entries = entries;
        }
        if let Some(entries) = env_usize(ENV_GROUP_ENTRIES)? {
            self.group_entries = entries;
        }
        self.validate()?;
        Ok(self)
    }

    /// Sketch capacities must be powers of two no smaller than
    /// [`MIN_SKETCH_ENTRIES`].
    pub fn validate(&self) -> SqlResult<()> {
        check_entries("count_distinct_entries", self.count_distinct_entries)?;
        check_entries("group_entries", self.group_entries)
    }
}

fn env_usize(name: &str) -> SqlResult<Option<usize>> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse::<usize>().map(Some).map_err(|_| {
            SqlError::configuration_error(format!("{} must be a positive integer, got '{}'", name, value))
        }),
        Err(_) => Ok(None),
    }
}

fn check_entries(name: &str, entries: usize) -> SqlResult<()> {
    if entries < MIN_SKETCH_ENTRIES || !entries.is_power_of_two() {
        return Err(SqlError::configuration_error(format!(
            "{} must be a power of two >= {}, got {}",
            name, MIN_SKETCH_ENTRIES, entries
        )));
    }
    Ok(())
}
