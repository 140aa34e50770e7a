//! Structured error types for map/fold execution
//!
//! Categorizes failures by where they occur in the pipeline so callers can
//! tell configuration problems apart from per-source read failures and from
//! deadline or cancellation outcomes.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for map/fold operations
pub type MapFoldResult<T> = Result<T, MapFoldError>;

/// Main error type for map/fold operations
#[derive(Debug, Error)]
pub enum MapFoldError {
    // Configuration errors - fatal, surfaced before any work starts
    #[error("missing required configuration key '{key}'")]
    MissingConfigKey { key: String },

    #[error("invalid configuration for '{field}': {reason}")]
    InvalidConfiguration {
        field: String,
        reason: String,
        value: String,
    },

    #[error("failed to load configuration from {path}")]
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Enumeration errors - fatal, no partial output
    #[error("failed to enumerate input sources under {path}: {reason}")]
    Enumeration {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Per-source errors - recorded on the worker's outcome; whether they
    // abort the run depends on the configured error policy
    #[error("failed to read input source '{locator}': {reason}")]
    SourceRead {
        locator: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("no input sources to process")]
    NoInput,

    #[error("{failed} of {total} workers failed during the map phase")]
    MapPhaseFailed { failed: usize, total: usize },

    // Deadline and cancellation, distinct from read failures
    #[error("map phase exceeded its deadline of {timeout:?}")]
    MapPhaseTimeout { timeout: Duration },

    #[error("execution cancelled")]
    Cancelled,

    // Invariant guard: the executor's barrier makes this unreachable, but
    // workers are usable directly and must not fold undefined partials
    #[error("reduce invoked on worker '{locator}' before its map completed")]
    ReduceBeforeMap { locator: String },

    #[error("{message}")]
    General {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MapFoldError {
    /// Create a general error with just a message
    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error aborts the run before any worker is constructed
    pub fn is_fatal_before_work(&self) -> bool {
        matches!(
            self,
            Self::MissingConfigKey { .. }
                | Self::InvalidConfiguration { .. }
                | Self::ConfigLoadFailed { .. }
                | Self::Enumeration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = MapFoldError::MissingConfigKey {
            key: "data_dir".to_string(),
        };
        assert!(err.to_string().contains("data_dir"));

        let err = MapFoldError::SourceRead {
            locator: "input/a.txt".to_string(),
            reason: "permission denied".to_string(),
            source: None,
        };
        assert!(err.to_string().contains("input/a.txt"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(MapFoldError::MissingConfigKey {
            key: "x".to_string()
        }
        .is_fatal_before_work());
        assert!(!MapFoldError::NoInput.is_fatal_before_work());
        assert!(!MapFoldError::Cancelled.is_fatal_before_work());
    }
}
