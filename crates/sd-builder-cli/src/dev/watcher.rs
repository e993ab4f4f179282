//! Filesystem watcher feeding change events to the watch coordinator.
//!
//! The project root is watched non-recursively (for `deps.json`, `.env` and
//! `package.json`) and the app directory recursively. Debouncing happens in
//! the coordinator, not here.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    fn from_event_kind(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

/// Keeps the underlying notify watcher alive; dropping it stops events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root` and `app_dir`.
    ///
    /// Paths under any of `ignore_dirs` (relative to `root`) and editor swap
    /// files are dropped before they reach the channel.
    pub fn new(
        root: PathBuf,
        app_dir: &Path,
        ignore_dirs: Vec<PathBuf>,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(256);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!("File watcher error: {}", err);
                    return;
                }
            };

            for path in event.paths {
                if should_ignore(&path, &filter_root, &ignore_dirs) {
                    continue;
                }
                if let Some(change) = FileChange::from_event_kind(&event.kind, path) {
                    tracing::trace!(?change, "File change");
                    // Receiver gone means the coordinator stopped.
                    if tx.blocking_send(change).is_err() {
                        return;
                    }
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        if app_dir.is_dir() {
            watcher.watch(app_dir, RecursiveMode::Recursive)?;
        } else {
            tracing::warn!("App directory {} does not exist, not watching it", app_dir.display());
        }

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Default directories never watched, relative to the project root.
pub fn default_ignores(build_dir: &Path, root: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("node_modules"), PathBuf::from(".git")];
    if let Ok(rel) = build_dir.strip_prefix(root) {
        dirs.push(rel.to_path_buf());
    }
    dirs
}

fn should_ignore(path: &Path, root: &Path, ignore_dirs: &[PathBuf]) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return true;
    };

    if ignore_dirs.iter().any(|dir| rel.starts_with(dir)) {
        return true;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".swp")
        || name.ends_with(".swx")
        || name.ends_with('~')
        || name.starts_with(".#")
}
