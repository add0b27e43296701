//! Configuration file loading.

use crate::config::RevisitConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, info};

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`)
    Toml,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Loads and validates [`RevisitConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, choosing the format by extension.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<RevisitConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;

        debug!(path = %path.display(), format = format.name(), "Loading configuration");

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::from_str(&text, format)?;
        info!(path = %path.display(), vault = %config.vault.root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_str(text: &str, format: ConfigFormat) -> ConfigResult<RevisitConfig> {
        let config: RevisitConfig = match format {
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| ConfigError::Parse {
                format: format.name(),
                message: e.to_string(),
            })?,
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse {
                format: format.name(),
                message: e.to_string(),
            })?,
            #[cfg(feature = "yaml")]
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
                format: format.name(),
                message: e.to_string(),
            })?,
            #[allow(unreachable_patterns)]
            other => return Err(ConfigError::UnsupportedFormat(other.name().to_string())),
        };

        config.validate()?;
        Ok(config)
    }
}
