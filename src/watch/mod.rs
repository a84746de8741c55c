//! File watcher.
//!
//! Observes a growing set of files and emits the registered key of a file
//! each time the filesystem reports a content change for it.
//!
//! Architecture:
//! ```text
//! notify callback --(dir event)--> target lookup --(key)--> events()
//! ```
//!
//! Each file is observed through a non-recursive watch on its parent
//! directory, so editors that save by renaming a temp file over the target
//! keep producing events after the first save.

#[cfg(test)]
mod tests;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch `{path}`: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot watch `{0}`: not a regular file")]
    NotAFile(String),

    #[error("cannot watch `{path}`: {source}")]
    Notify {
        path: String,
        #[source]
        source: notify::Error,
    },
}

/// Something that can start observing a path.
pub trait Watch: Send + Sync {
    /// Begin observing `path`. Adding the same path twice is a no-op.
    fn add(&self, path: &str) -> Result<(), WatchError>;
}

/// Resolved file path -> registered keys naming it.
type Targets = Arc<RwLock<FxHashMap<PathBuf, Vec<String>>>>;

/// Watcher backed by the OS notification primitive.
pub struct FsWatcher {
    /// Watcher handle and the directories it observes
    state: Mutex<WatchState>,
    targets: Targets,
    /// Taken by the first `events()` call
    events: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

struct WatchState {
    watcher: RecommendedWatcher,
    dirs: FxHashSet<PathBuf>,
}

impl FsWatcher {
    /// Create the watcher. Failure here means no watching is possible at all.
    pub fn new() -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let targets: Targets = Arc::default();

        let lookup = Arc::clone(&targets);
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => dispatch(&event, &lookup, &tx),
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })?;

        Ok(Self {
            state: Mutex::new(WatchState {
                watcher,
                dirs: FxHashSet::default(),
            }),
            targets,
            events: Mutex::new(Some(rx)),
        })
    }

    /// The change feed. Returns `None` after the first call.
    pub fn events(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.events.lock().take()
    }
}

impl Watch for FsWatcher {
    fn add(&self, path: &str) -> Result<(), WatchError> {
        let target = resolve_target(path)?;

        let mut state = self.state.lock();
        if let Some(keys) = self.targets.read().get(&target)
            && keys.iter().any(|k| k == path)
        {
            return Ok(());
        }

        let dir = target.parent().map(Path::to_path_buf).unwrap_or_default();
        if !state.dirs.contains(&dir) {
            state
                .watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Notify {
                    path: path.to_owned(),
                    source,
                })?;
            crate::debug!("watch"; "observing {}", dir.display());
            state.dirs.insert(dir);
        }

        self.targets
            .write()
            .entry(target)
            .or_default()
            .push(path.to_owned());
        crate::debug!("watch"; "added {}", path);
        Ok(())
    }
}

/// Map `path` to the form notify reports for it: the fully resolved file.
///
/// A symlink resolves to the file it points at, so its directory is the one
/// watched and edits to the target are seen.
fn resolve_target(path: &str) -> Result<PathBuf, WatchError> {
    let open_err = |source| WatchError::Open {
        path: path.to_owned(),
        source,
    };

    let raw = Path::new(path);
    let meta = std::fs::metadata(raw).map_err(open_err)?;
    if !meta.is_file() {
        return Err(WatchError::NotAFile(path.to_owned()));
    }

    raw.canonicalize().map_err(open_err)
}

/// Whether an event kind may mean the file content changed.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        // Metadata-only changes (mtime/chmod) and the source side of a rename
        EventKind::Modify(ModifyKind::Metadata(_) | ModifyKind::Name(RenameMode::From)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

fn dispatch(event: &notify::Event, targets: &Targets, tx: &mpsc::UnboundedSender<String>) {
    if !is_content_change(&event.kind) {
        return;
    }

    let targets = targets.read();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for path in &event.paths {
        let Some(keys) = targets.get(path) else {
            continue;
        };
        for key in keys {
            if seen.insert(key.as_str()) {
                crate::debug!("watch"; "changed: {}", key);
                // Receiver gone means the consumer stopped; nothing left to notify.
                let _ = tx.send(key.clone());
            }
        }
    }
}
