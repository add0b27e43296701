//! Notify-based file watching backend.

use crate::{
    error::{Error, Result},
    events::{FileEvent, FileEventKind},
};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use revisit_config::RevisitConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Recursive, debounced watcher over a vault root.
///
/// Events are converted to [`FileEvent`]s with vault-relative paths and sent
/// on the channel given at construction. Watching stops when the watcher is
/// dropped.
pub struct NotifyWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    root: PathBuf,
}

impl NotifyWatcher {
    /// Start watching `root`.
    pub fn new(
        root: impl AsRef<Path>,
        debounce: Duration,
        sender: mpsc::UnboundedSender<FileEvent>,
    ) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref()).map_err(|e| {
            Error::InvalidPath(format!("{}: {}", root.as_ref().display(), e))
        })?;

        let event_root = root.clone();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        let Some(file_event) = convert_event(&event_root, &event.event) else {
                            continue;
                        };
                        if sender.send(file_event).is_err() {
                            debug!("Event receiver dropped");
                            return;
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!(error = %error, "Notify error");
                    }
                }
            }
        })
        .map_err(|e| Error::Watch(format!("Failed to create notify watcher: {}", e)))?;

        debouncer
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("Failed to watch path: {}", e)))?;

        info!(
            root = %root.display(),
            debounce_ms = debounce.as_millis() as u64,
            "Watching vault"
        );
        Ok(Self { debouncer, root })
    }

    /// Watch the vault named by `config` with its debounce setting.
    pub fn from_config(
        config: &RevisitConfig,
        sender: mpsc::UnboundedSender<FileEvent>,
    ) -> Result<Self> {
        Self::new(
            &config.vault.root,
            Duration::from_millis(config.watch.debounce_ms),
            sender,
        )
    }

    /// Canonical vault root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend_type(&self) -> &'static str {
        "notify"
    }

    /// Stop watching and flush nothing further.
    pub fn stop(self) {
        info!(root = %self.root.display(), "Stopped watching vault");
        self.debouncer.stop();
    }
}

/// Convert a notify event under `root` to a vault-relative [`FileEvent`].
///
/// Access events and paths outside the vault yield `None`. An event naming
/// several paths becomes a batch.
pub fn convert_event(root: &Path, event: &Event) -> Option<FileEvent> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        if let [from, to] = event.paths.as_slice() {
            return convert_rename(root, from, to);
        }
    }
    if let EventKind::Access(_) = event.kind {
        return None;
    }

    let mut leaves: Vec<FileEvent> = event
        .paths
        .iter()
        .filter_map(|path| {
            let relative = relative_to(root, path)?;
            let kind = match event.kind {
                EventKind::Create(_) => FileEventKind::Created,
                EventKind::Remove(_) => FileEventKind::Deleted,
                EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FileEventKind::Deleted,
                EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FileEventKind::Created,
                // Unpaired rename: whichever side this path is on.
                EventKind::Modify(ModifyKind::Name(_)) if path.exists() => FileEventKind::Created,
                EventKind::Modify(ModifyKind::Name(_)) => FileEventKind::Deleted,
                EventKind::Modify(_) => FileEventKind::Modified,
                _ => FileEventKind::Unknown(format!("{:?}", event.kind)),
            };
            Some(FileEvent::new(kind, relative).with_dir(path.is_dir()))
        })
        .collect();

    match leaves.len() {
        0 => None,
        1 => leaves.pop(),
        _ => Some(FileEvent::batch(leaves)),
    }
}

fn convert_rename(root: &Path, from: &Path, to: &Path) -> Option<FileEvent> {
    let is_dir = to.is_dir();
    match (relative_to(root, from), relative_to(root, to)) {
        (Some(from), Some(to)) => Some(
            FileEvent::new(
                FileEventKind::Moved {
                    from,
                    to: to.clone(),
                },
                to,
            )
            .with_dir(is_dir),
        ),
        (Some(from), None) => Some(FileEvent::new(FileEventKind::Deleted, from)),
        (None, Some(to)) => Some(FileEvent::new(FileEventKind::Created, to).with_dir(is_dir)),
        (None, None) => None,
    }
}

fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative.to_path_buf())
    }
}
