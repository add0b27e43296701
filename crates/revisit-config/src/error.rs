//! Error types for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed in the given format.
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Format name (`toml`, `yaml`, `json`).
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// File extension does not map to a supported (or enabled) format.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A field holds a value the system cannot work with.
    #[error("Invalid value for '{field}': {message}")]
    Validation {
        /// Dotted field path, e.g. `review.batch_limit`.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
