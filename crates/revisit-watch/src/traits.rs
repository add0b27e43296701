//! Core traits for the file watching system.

use crate::{error::Result, events::FileEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for handling file events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle a single file event.
    async fn handle(&self, event: FileEvent) -> Result<()>;

    /// Get the handler name.
    fn name(&self) -> &'static str;

    /// Get handler priority (higher numbers = higher priority).
    fn priority(&self) -> u32 {
        100
    }

    /// Check if this handler can process the given event.
    fn can_handle(&self, _event: &FileEvent) -> bool {
        true
    }
}

#[async_trait]
impl<T: EventHandler + ?Sized> EventHandler for Arc<T> {
    async fn handle(&self, event: FileEvent) -> Result<()> {
        (**self).handle(event).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn priority(&self) -> u32 {
        (**self).priority()
    }

    fn can_handle(&self, event: &FileEvent) -> bool {
        (**self).can_handle(event)
    }
}
