//! Configuration error types.

use std::path::PathBuf;

use otelop_core::{AutoDetectError, BoxError};
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while detecting the platform or loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform detector failed. The stored platform is unchanged.
    #[error(transparent)]
    AutoDetect(#[from] AutoDetectError),

    /// A change callback failed. The new platform has already been stored.
    #[error("change callback #{index} failed: {source}")]
    OnChange {
        /// Position of the callback in registration order.
        index: usize,
        /// Error returned by the callback.
        #[source]
        source: BoxError,
    },

    /// Settings file not found.
    #[error("settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read settings file.
    #[error("failed to read settings file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML settings: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON settings: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Settings format is neither TOML nor JSON.
    #[error("unsupported settings format: {format}")]
    UnsupportedFormat {
        /// The rejected format or file name.
        format: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },
}

impl ConfigError {
    /// Create a new change callback error.
    pub fn on_change(index: usize, source: BoxError) -> Self {
        Self::OnChange { index, source }
    }

    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures that a later detection attempt may not repeat.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AutoDetect(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_detect_error_is_transparent() {
        let err = ConfigError::from(AutoDetectError::unavailable("no discovery endpoint"));
        assert!(err.to_string().contains("no discovery endpoint"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_on_change_error() {
        let err = ConfigError::on_change(2, "reconcile failed".into());
        assert!(err.to_string().contains("#2"));
        assert!(err.to_string().contains("reconcile failed"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/otelop/settings.toml");
        assert!(err.to_string().contains("/etc/otelop/settings.toml"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("OTELOP__PLATFORM", "unknown platform");
        assert!(err.to_string().contains("OTELOP__PLATFORM"));
        assert!(err.to_string().contains("unknown platform"));
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = ConfigError::unsupported_format("yaml");
        assert!(err.to_string().contains("yaml"));
    }
}
