//! Test doubles for the renderer and watcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tempfile::TempDir;

use crate::cache::Cache;
use crate::credential::{Credential, CredentialStore};
use crate::render::{RenderError, Renderer};
use crate::watch::{Watch, WatchError};

/// Parked render call: `started` fires on entry, the call returns once
/// `release` receives.
pub struct Gate {
    pub started: Receiver<()>,
    pub release: Sender<()>,
}

/// Renders `# X` to `<h1>X</h1>`, `!fail` to a 401, anything else to `<p>..</p>`.
#[derive(Default)]
pub struct StubRenderer {
    calls: AtomicUsize,
    delay: Option<Duration>,
    gates: Mutex<FxHashMap<usize, (Sender<()>, Receiver<()>)>>,
    /// (text, start, end) per finished call
    pub spans: Mutex<Vec<(String, Instant, Instant)>>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Park the `n`th call (0-based).
    pub fn gate(&self, n: usize) -> Gate {
        let (started_tx, started_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        self.gates.lock().insert(n, (started_tx, release_rx));
        Gate {
            started: started_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renderer for StubRenderer {
    fn render(&self, text: &str, _credential: &Credential) -> Result<String, RenderError> {
        let start = Instant::now();
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().remove(&n);
        if let Some((started, release)) = gate {
            let _ = started.send(());
            let _ = release.recv();
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let text = text.trim();
        let result = if text == "!fail" {
            Err(RenderError::Service {
                status: 401,
                message: "Bad credentials".into(),
            })
        } else if let Some(title) = text.strip_prefix("# ") {
            Ok(format!("<h1>{title}</h1>"))
        } else {
            Ok(format!("<p>{text}</p>"))
        };

        self.spans
            .lock()
            .push((text.to_owned(), start, Instant::now()));
        result
    }
}

/// Records added paths; paths containing "unwatchable" fail.
#[derive(Default)]
pub struct StubWatcher {
    pub added: Mutex<FxHashSet<String>>,
}

impl Watch for StubWatcher {
    fn add(&self, path: &str) -> Result<(), WatchError> {
        if path.contains("unwatchable") {
            return Err(WatchError::NotAFile(path.to_owned()));
        }
        self.added.lock().insert(path.to_owned());
        Ok(())
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub credentials: Arc<CredentialStore>,
    pub renderer: Arc<StubRenderer>,
    pub watcher: Arc<StubWatcher>,
    pub cache: Arc<Cache>,
}

impl Fixture {
    pub fn new(renderer: StubRenderer, authorized: bool) -> Self {
        let credentials = Arc::new(CredentialStore::new());
        if authorized {
            credentials.install("test-token").unwrap();
        }
        let renderer = Arc::new(renderer);
        let watcher = Arc::new(StubWatcher::default());
        let cache = Arc::new(Cache::new(
            Arc::clone(&credentials),
            Arc::clone(&renderer) as Arc<dyn Renderer>,
            Arc::clone(&watcher) as Arc<dyn Watch>,
            64,
        ));
        Self {
            dir: TempDir::new().unwrap(),
            credentials,
            renderer,
            watcher,
            cache,
        }
    }

    /// Write `content` to `name` inside the fixture dir, returning its path.
    pub fn write(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }
}
