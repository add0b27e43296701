//! Logging initialisation.
//!
//! Installs a `tracing-subscriber` fmt subscriber. `RUST_LOG`, when set, takes
//! precedence over the configured level.

use crate::config::LoggingConfig;
use std::sync::Once;
use tracing::info;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

const REVISIT_TARGETS: [&str; 4] = [
    "revisit_config",
    "revisit_core",
    "revisit_sqlite",
    "revisit_watch",
];

/// Initialize the global subscriber. Subsequent calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(build_filter_string(config)));

        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.include_target)
            .with_ansi(config.ansi)
            .try_init();

        // Another subscriber (e.g. a host application's) already owns the slot.
        if result.is_ok() {
            info!(level = %config.level, "Logging initialized");
        }
    });
}

/// Build an `EnvFilter` directive string from configuration.
///
/// Third-party crates stay at `warn`; revisit crates use the configured level.
pub fn build_filter_string(config: &LoggingConfig) -> String {
    let level = config.level.to_lowercase();
    let mut filter = String::from("warn");
    for target in REVISIT_TARGETS {
        filter.push_str(&format!(",{}={}", target, level));
    }
    filter
}
