//! Event handlers and their registry.

mod reconcile;

pub use reconcile::ReconcileHandler;

use crate::{events::FileEvent, traits::EventHandler};
use std::sync::Arc;
use tracing::{debug, error};

/// Handlers ordered by descending priority.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler; equal priorities keep registration order.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        debug!(handler = handler.name(), priority = handler.priority(), "Registering handler");
        self.handlers.push(handler);
        self.handlers.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn handlers(&self) -> &[Arc<dyn EventHandler>] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Pass `event` to every handler that accepts it, highest priority first.
    ///
    /// A failing handler is logged and does not stop the others. Returns the
    /// number of handlers that completed successfully.
    pub async fn dispatch(&self, event: &FileEvent) -> usize {
        let mut handled = 0;
        for handler in &self.handlers {
            if !handler.can_handle(event) {
                continue;
            }
            match handler.handle(event.clone()).await {
                Ok(()) => handled += 1,
                Err(e) => error!(
                    handler = handler.name(),
                    kind = event.kind.as_str(),
                    path = %event.path.display(),
                    error = %e,
                    "Event handler failed"
                ),
            }
        }
        handled
    }
}
