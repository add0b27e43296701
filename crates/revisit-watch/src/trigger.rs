//! Coalescing of full reconciliation requests.
//!
//! Bursts of structural events (a folder copied in, a bulk rename) each ask
//! for a full run. While one run is in progress further requests only raise
//! a pending flag, and the running caller loops until the flag stays clear.

use revisit_core::{ReconcileReport, ReconcileResult, Reconciler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of [`ReconcileTrigger::fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// This caller ran the reconciler; holds the report of its last run.
    Completed(ReconcileReport),
    /// A run already in progress will pick the request up.
    Coalesced,
}

/// Runs the reconciler on demand, folding overlapping requests together.
pub struct ReconcileTrigger {
    reconciler: Arc<Reconciler>,
    pending: AtomicBool,
    running: Mutex<()>,
}

impl ReconcileTrigger {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            reconciler,
            pending: AtomicBool::new(false),
            running: Mutex::new(()),
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Whether a request is waiting for the running caller.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Request a full reconciliation.
    ///
    /// On error the request stays pending, so the next one retries.
    pub async fn fire(&self) -> ReconcileResult<TriggerOutcome> {
        self.pending.store(true, Ordering::SeqCst);

        let mut last = None;
        loop {
            let Ok(guard) = self.running.try_lock() else {
                debug!("Reconciliation already running, request coalesced");
                break;
            };
            while self.pending.swap(false, Ordering::SeqCst) {
                match self.reconciler.run().await {
                    Ok(report) => last = Some(report),
                    Err(e) => {
                        self.pending.store(true, Ordering::SeqCst);
                        return Err(e);
                    }
                }
            }
            drop(guard);

            // A request may have landed between the last swap and the unlock.
            if !self.pending.load(Ordering::SeqCst) {
                break;
            }
        }

        Ok(match last {
            Some(report) => TriggerOutcome::Completed(report),
            None => TriggerOutcome::Coalesced,
        })
    }
}
