//! Event loop that feeds watcher events to the registered handlers.

use crate::{
    events::FileEvent,
    handlers::{HandlerRegistry, ReconcileHandler},
    traits::EventHandler,
};
use revisit_core::Reconciler;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Receives [`FileEvent`]s and dispatches them one at a time.
pub struct WatchService {
    registry: HandlerRegistry,
    events: mpsc::UnboundedReceiver<FileEvent>,
}

impl WatchService {
    /// Create a service and the sender its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedSender<FileEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                registry: HandlerRegistry::new(),
                events: rx,
            },
            tx,
        )
    }

    /// Service with a [`ReconcileHandler`] over `reconciler` registered.
    pub fn for_reconciler(
        reconciler: Arc<Reconciler>,
    ) -> (Self, mpsc::UnboundedSender<FileEvent>) {
        let (mut service, tx) = Self::channel();
        service.register(Arc::new(ReconcileHandler::new(reconciler)));
        (service, tx)
    }

    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.registry.register(handler);
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatch one event; returns how many handlers succeeded.
    pub async fn dispatch(&self, event: FileEvent) -> usize {
        debug!(
            id = %event.id,
            kind = event.kind.as_str(),
            path = %event.path.display(),
            "Dispatching file event"
        );
        self.registry.dispatch(&event).await
    }

    /// Process events until `shutdown` fires or every sender is dropped.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(handlers = self.registry.len(), "Watch service started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Watch service shutting down");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => {
                        self.dispatch(event).await;
                    }
                    None => {
                        info!("Event channel closed, watch service stopping");
                        break;
                    }
                },
            }
        }
    }
}
