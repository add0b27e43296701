//! Storage error types.

use thiserror::Error;

/// Error type for note/tag store operations
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// A stored value could not be read back, e.g. a malformed timestamp.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Schema or connection settings are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The database was busy or locked by another connection.
    #[error("Concurrent access error: {0}")]
    ConcurrentAccess(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
