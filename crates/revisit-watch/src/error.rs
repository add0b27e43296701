//! Error types for the file watching system.

use revisit_core::ReconcileError;
use thiserror::Error;

/// Errors that can occur during file watching operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reconciling the store after an event failed.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Event handling error.
    #[error("Event handling error: {0}")]
    Handler(String),

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for file watching operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err.to_string())
    }
}
