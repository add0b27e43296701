//! Error types for SQLite storage

use revisit_core::storage::StorageError;
use thiserror::Error;

/// SQLite storage error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for StorageError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::Backend(msg),
            SqliteError::Schema(msg) => Self::Configuration(msg),
            SqliteError::Rusqlite(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Self::ConcurrentAccess(msg.unwrap_or_else(|| e.to_string()))
            }
            SqliteError::Rusqlite(rusqlite::Error::FromSqlConversionFailure(_, _, e)) => {
                Self::Deserialization(e.to_string())
            }
            SqliteError::Rusqlite(e) => Self::Backend(e.to_string()),
        }
    }
}
