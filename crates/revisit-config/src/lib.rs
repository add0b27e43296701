//! # Revisit Configuration Library
//!
//! Type-safe configuration for the revisit note review system.
//!
//! ## Features
//!
//! - Multi-format support (TOML, YAML, JSON)
//! - Defaults for every section, so a partial file is always valid input
//! - Validation with field-level error messages
//! - Logging initialisation driven by the `[logging]` section
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use revisit_config::{ConfigLoader, init_logging};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("revisit.toml").await?;
//!     init_logging(&config.logging);
//!     println!("snapshot lives at {}", config.snapshot_path().display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;
mod logging;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader};
pub use logging::{build_filter_string, init_logging};
