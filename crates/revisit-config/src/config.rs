//! Configuration schema.
//!
//! Every section implements [`Default`] and is deserialised with
//! `#[serde(default)]`, so a file only needs the keys it wants to override.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisitConfig {
    /// Where the notes live and which files count as notes.
    pub vault: VaultConfig,
    /// Where revisit keeps its own state.
    pub storage: StorageConfig,
    /// Review queue behaviour.
    pub review: ReviewConfig,
    /// File watching.
    pub watch: WatchConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Vault (note tree) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the vault.
    pub root: PathBuf,
    /// File extensions (without the dot) that are tracked as notes.
    pub note_extensions: Vec<String>,
    /// Maximum directory depth walked below the root.
    pub max_depth: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            note_extensions: vec!["md".to_string()],
            max_depth: 64,
        }
    }
}

/// Persistent state locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State directory. Relative paths resolve against the vault root.
    pub dir: PathBuf,
    /// File name of the serialized tree snapshot inside `dir`.
    pub snapshot_file: String,
    /// File name of the SQLite database inside `dir`.
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".revisit"),
            snapshot_file: "snapshot.json".to_string(),
            database_file: "revisit.db".to_string(),
        }
    }
}

/// Review queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// A note becomes due this many days after its last review.
    pub due_after_days: u32,
    /// How many notes a dashboard fetch returns.
    pub batch_limit: usize,
    /// Number of leading lines searched for the `Tags:` header.
    pub tag_scan_lines: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            due_after_days: 15,
            batch_limit: 10,
            tag_scan_lines: 10,
        }
    }
}

/// File watching configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether the vault is watched for changes at all.
    pub enabled: bool,
    /// Debounce window for file system events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 500,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for revisit crates (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Include the event target (module path) in output.
    pub include_target: bool,
    /// Colourise output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_target: true,
            ansi: true,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl RevisitConfig {
    /// Configuration rooted at `root` with every other value defaulted.
    pub fn for_vault(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.vault.root = root.into();
        config
    }

    /// Resolved state directory.
    pub fn storage_dir(&self) -> PathBuf {
        resolve_against(&self.vault.root, &self.storage.dir)
    }

    /// Resolved snapshot file path.
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage_dir().join(&self.storage.snapshot_file)
    }

    /// Resolved database file path.
    pub fn database_path(&self) -> PathBuf {
        self.storage_dir().join(&self.storage.database_file)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.vault.note_extensions.is_empty() {
            return Err(ConfigError::validation(
                "vault.note_extensions",
                "at least one note extension is required",
            ));
        }
        if let Some(bad) = self
            .vault
            .note_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::validation(
                "vault.note_extensions",
                format!("'{}' must be a bare extension such as 'md'", bad),
            ));
        }
        if self.vault.max_depth == 0 {
            return Err(ConfigError::validation(
                "vault.max_depth",
                "maximum depth must be greater than 0",
            ));
        }
        if self.storage.snapshot_file.trim().is_empty() {
            return Err(ConfigError::validation(
                "storage.snapshot_file",
                "file name must not be empty",
            ));
        }
        if self.storage.database_file.trim().is_empty() {
            return Err(ConfigError::validation(
                "storage.database_file",
                "file name must not be empty",
            ));
        }
        if self.review.batch_limit == 0 {
            return Err(ConfigError::validation(
                "review.batch_limit",
                "batch limit must be greater than 0",
            ));
        }
        if self.review.tag_scan_lines == 0 {
            return Err(ConfigError::validation(
                "review.tag_scan_lines",
                "at least one line must be scanned for tags",
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }
        Ok(())
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
