//! # Revisit file watching
//!
//! Watches a vault and keeps the note store current while the host runs:
//!
//! ```text
//! NotifyWatcher ──FileEvent──▶ WatchService ──▶ ReconcileHandler ──▶ Reconciler
//!  (debounced)                  (priority order)   (refresh / coalesced run)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let reconciler = Arc::new(Reconciler::for_config(&config, store));
//! reconciler.run().await?;
//! if let Some((watcher, service)) = revisit_watch::watch_vault(&config, reconciler)? {
//!     let (stop, stopped) = tokio::sync::oneshot::channel();
//!     tokio::spawn(service.run(stopped));
//!     // ...
//!     let _ = stop.send(());
//!     watcher.stop();
//! }
//! ```

#![deny(unsafe_code)]

pub mod backends;
pub mod error;
mod events;
pub mod handlers;
mod service;
pub mod traits;
mod trigger;

pub use backends::{convert_event, NotifyWatcher};
pub use error::{Error, Result};
pub use events::{location_of, FileEvent, FileEventKind};
pub use handlers::{HandlerRegistry, ReconcileHandler};
pub use service::WatchService;
pub use traits::EventHandler;
pub use trigger::{ReconcileTrigger, TriggerOutcome};

use revisit_config::RevisitConfig;
use revisit_core::Reconciler;
use std::sync::Arc;
use tracing::info;

/// Start watching the vault named by `config`.
///
/// Returns the running watcher and a service with a [`ReconcileHandler`]
/// registered, or `None` when watching is disabled in the configuration.
pub fn watch_vault(
    config: &RevisitConfig,
    reconciler: Arc<Reconciler>,
) -> Result<Option<(NotifyWatcher, WatchService)>> {
    if !config.watch.enabled {
        info!("File watching disabled");
        return Ok(None);
    }

    let (service, sender) = WatchService::for_reconciler(reconciler);
    let watcher = NotifyWatcher::from_config(config, sender)?;
    Ok(Some((watcher, service)))
}
