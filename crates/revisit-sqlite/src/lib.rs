//! SQLite storage backend for revisit
//!
//! This crate provides a SQLite-based implementation of revisit's
//! [`NoteStore`](revisit_core::NoteStore) contract, so review state survives
//! restarts.
//!
//! ## Features
//!
//! - **Versioned schema**: migrations tracked in `schema_migrations`
//! - **WAL Mode**: concurrent readers with write-ahead logging
//! - **Thread Safety**: `Arc<Mutex<Connection>>`, with all queries run on the
//!   blocking thread pool
//!
//! ## Usage
//!
//! ```rust,ignore
//! use revisit_sqlite::{SqliteConfig, SqliteNoteStore};
//! use revisit_core::NoteStore;
//!
//! let store = SqliteNoteStore::open(SqliteConfig::new("./.revisit/revisit.db"))?;
//! let due = store.unreviewed_notes(15, 10).await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod note_store;
pub mod schema;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use note_store::SqliteNoteStore;
