//! Job and executor configuration
//!
//! A job carries two layers of configuration: the opaque [`JobConfig`] map
//! that only the input enumerator interprets, and the [`ExecutorConfig`]
//! that controls parallelism, deadline, and error policy. Both can be read
//! from a single YAML document via [`JobFile`].

use crate::error::{MapFoldError, MapFoldResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Opaque option map interpreted only by the enumerator in use.
///
/// No other component inspects it. Enumerators pull out the keys they need
/// (e.g. `data_dir`) and fail with a configuration error when a required
/// key is absent or has the wrong shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct JobConfig(BTreeMap<String, Value>);

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, builder-style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fetch a required string option
    pub fn require_str(&self, key: &str) -> MapFoldResult<&str> {
        let value = self
            .get(key)
            .ok_or_else(|| MapFoldError::MissingConfigKey {
                key: key.to_string(),
            })?;
        value
            .as_str()
            .ok_or_else(|| MapFoldError::InvalidConfiguration {
                field: key.to_string(),
                reason: "expected a string value".to_string(),
                value: value.to_string(),
            })
    }
}

impl FromIterator<(String, Value)> for JobConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How the executor reacts to a worker failing its map call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the run on the first recorded map failure, producing no result
    #[default]
    FailFast,
    /// Drop failed workers from the fold and report them in the outcomes
    Continue,
}

/// Settings that shape the map phase fan-out and the run's failure behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum concurrent map calls
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Deadline for the whole map phase, e.g. "30s"
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Failure policy for individual map calls
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_max_parallel() -> usize {
    10
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            timeout: None,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> MapFoldResult<()> {
        if self.max_parallel == 0 {
            return Err(MapFoldError::InvalidConfiguration {
                field: "max_parallel".to_string(),
                reason: "must be greater than 0".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// A complete job description loaded from a YAML file.
///
/// Executor settings sit at the top level; every unrecognized key becomes
/// part of the opaque enumerator configuration:
///
/// ```yaml
/// data_dir: ./inputs
/// max_parallel: 4
/// timeout: 30s
/// error_policy: continue
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    #[serde(flatten)]
    pub executor: ExecutorConfig,
    #[serde(flatten)]
    pub options: JobConfig,
}

impl JobFile {
    /// Load and parse a job file
    pub fn load(path: &Path) -> MapFoldResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MapFoldError::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: format!("failed to read file: {}", e),
                source: Some(Box::new(e)),
            })?;

        let job: JobFile =
            serde_yaml::from_str(&content).map_err(|e| MapFoldError::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: format!("failed to parse YAML: {}", e),
                source: Some(Box::new(e)),
            })?;

        job.executor.validate()?;
        Ok(job)
    }
}
