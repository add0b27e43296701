//! Keeps the note store in step with vault file events.
//!
//! | Event                           | Action                        |
//! |---------------------------------|-------------------------------|
//! | `Modified` on a file            | `Reconciler::refresh_note`    |
//! | `Created`, `Deleted`, `Moved`   | coalesced full reconciliation |
//! | `Created`, `Moved` on a file    | also refresh the new path     |
//! | hidden paths, `Unknown`         | ignored                       |
//!
//! A `Batch` is flattened first and asks for at most one full run.

use crate::error::Result;
use crate::events::{FileEvent, FileEventKind};
use crate::traits::EventHandler;
use crate::trigger::{ReconcileTrigger, TriggerOutcome};
use async_trait::async_trait;
use revisit_core::{Reconciler, RefreshOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Handler that reconciles the store when vault files change.
pub struct ReconcileHandler {
    trigger: Arc<ReconcileTrigger>,
}

impl ReconcileHandler {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self::with_trigger(Arc::new(ReconcileTrigger::new(reconciler)))
    }

    /// Share a trigger with other callers, so their requests coalesce too.
    pub fn with_trigger(trigger: Arc<ReconcileTrigger>) -> Self {
        Self { trigger }
    }

    pub fn trigger(&self) -> &Arc<ReconcileTrigger> {
        &self.trigger
    }

    fn reconciler(&self) -> &Reconciler {
        self.trigger.reconciler()
    }
}

/// What a (flattened) event asks of the reconciler.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    full_run: bool,
    refresh: BTreeSet<String>,
}

fn plan(event: FileEvent) -> Plan {
    let mut plan = Plan::default();
    for leaf in event.flatten() {
        if leaf.is_hidden() {
            continue;
        }
        match &leaf.kind {
            FileEventKind::Modified if !leaf.is_dir => {}
            FileEventKind::Deleted => {
                plan.full_run = true;
                continue;
            }
            kind if kind.changes_tree() => plan.full_run = true,
            _ => {
                debug!(kind = leaf.kind.as_str(), path = %leaf.path.display(), "Ignoring event");
                continue;
            }
        }
        // Saves that replace the file (write then rename) arrive as a create
        // or move of an already known path, which the tree diff cannot see.
        if !leaf.is_dir {
            if let Some(location) = leaf.location() {
                plan.refresh.insert(location);
            }
        }
    }
    plan
}

#[async_trait]
impl EventHandler for ReconcileHandler {
    async fn handle(&self, event: FileEvent) -> Result<()> {
        let plan = plan(event);

        if plan.full_run {
            match self.trigger.fire().await? {
                TriggerOutcome::Completed(report) => {
                    debug!(mode = ?report.mode, "Reconciled after file event")
                }
                TriggerOutcome::Coalesced => debug!("Reconciliation request coalesced"),
            }
        }

        for location in plan.refresh {
            match self.reconciler().refresh_note(&location).await? {
                RefreshOutcome::Updated { added, dropped } => {
                    info!(location, added = ?added, dropped = ?dropped, "Tags changed on edit")
                }
                outcome => debug!(location, outcome = ?outcome, "Refreshed note"),
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "reconcile"
    }

    fn can_handle(&self, event: &FileEvent) -> bool {
        !matches!(event.kind, FileEventKind::Unknown(_))
    }
}
