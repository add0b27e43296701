//! Connection settings.

use revisit_config::RevisitConfig;
use std::path::{Path, PathBuf};

const MEMORY_PATH: &str = ":memory:";

/// SQLite connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    /// Enable write-ahead logging
    pub wal_mode: bool,
    /// Enforce foreign keys
    pub foreign_keys: bool,
    pub busy_timeout_ms: u32,
    /// Page cache size (negative values are KiB)
    pub cache_size: i32,
    /// Memory-mapped I/O size in bytes, 0 disables
    pub mmap_size: u64,
}

impl SqliteConfig {
    /// File-backed database with WAL enabled
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
            cache_size: -16_000,
            mmap_size: 0,
        }
    }

    /// In-memory database for tests
    pub fn memory() -> Self {
        Self {
            wal_mode: false,
            ..Self::new(MEMORY_PATH)
        }
    }

    /// Database file named by the revisit configuration
    pub fn from_revisit(config: &RevisitConfig) -> Self {
        Self::new(config.database_path())
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(MEMORY_PATH)
    }

    #[must_use]
    pub fn with_wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_mmap_size(mut self, bytes: u64) -> Self {
        self.mmap_size = bytes;
        self
    }
}
