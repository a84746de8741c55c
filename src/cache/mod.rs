//! Artifact cache: path -> rendered page.
//!
//! The single source of truth for what each registered file renders to.
//!
//! ```text
//! register_paths --+                  +--> get / artifact / list_paths
//!                  +--> render --> map
//! watch event -----+                  +--> on_update (after the map write)
//! ```
//!
//! The map lock is only held around in-memory mutation. File reads and the
//! remote render call happen with no lock held, so a slow render never
//! stalls readers or other writers.
//!
//! Every render takes a ticket when it starts. A completion is applied only
//! if its ticket is newer than the one that produced the stored artifact, so
//! an older render finishing late cannot overwrite a newer result.

mod artifact;

pub use artifact::{Artifact, ArtifactError, ArtifactStatus};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;
use tokio::sync::broadcast;

use crate::credential::CredentialStore;
use crate::render::{self, RenderError, Renderer};
use crate::watch::Watch;

pub struct Cache {
    /// Sorted by key, so listing needs no extra sort
    artifacts: RwLock<BTreeMap<String, Artifact>>,
    credentials: Arc<CredentialStore>,
    renderer: Arc<dyn Renderer>,
    watcher: Arc<dyn Watch>,
    tickets: AtomicU64,
    updates: broadcast::Sender<String>,
}

impl Cache {
    pub fn new(
        credentials: Arc<CredentialStore>,
        renderer: Arc<dyn Renderer>,
        watcher: Arc<dyn Watch>,
        update_buffer: usize,
    ) -> Self {
        let (updates, _) = broadcast::channel(update_buffer.max(1));
        Self {
            artifacts: RwLock::new(BTreeMap::new()),
            credentials,
            renderer,
            watcher,
            tickets: AtomicU64::new(0),
            updates,
        }
    }

    /// Register a batch of paths.
    ///
    /// Each new path first becomes an empty placeholder. Without a credential
    /// that is all; with one, each path is then watched and rendered; a failure on one path is
    /// recorded on its artifact and the rest of the batch proceeds.
    pub fn register_paths<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();

        self.insert_placeholders(&paths);

        if !self.credentials.has_credential() {
            crate::debug!("cache"; "{} placeholder(s) awaiting credential", paths.len());
            return;
        }

        // Keys exist before their watch starts, so a change event arriving
        // while the first render is in flight is not treated as unregistered
        paths.par_iter().for_each(|path| {
            if let Err(e) = self.watcher.add(path) {
                crate::log!("watch"; "{}", e);
                let ticket = self.next_ticket();
                self.commit(path, ticket, Err(ArtifactError::from(e).to_string()));
                return;
            }
            // Failure is already recorded on the artifact
            let _ = self.render(path);
        });
    }

    /// Insert missing keys as `Unrendered`. Existing artifacts are kept.
    fn insert_placeholders(&self, paths: &[String]) {
        let mut map = self.artifacts.write();
        for path in paths {
            map.entry(path.clone())
                .or_insert_with(|| Artifact::placeholder(path));
        }
    }

    /// Re-register every known path (e.g. after a credential arrives).
    pub fn register_all(&self) {
        self.register_paths(self.list_paths());
    }

    /// Read `path`, render it and store the outcome, then publish on `on_update`.
    ///
    /// Not retried on failure; the failure is stored and returned.
    pub fn render(&self, path: &str) -> Result<(), ArtifactError> {
        let ticket = self.next_ticket();
        let result = self.produce(path);

        let outcome = match &result {
            Ok(html) => Ok(render::wrap(html)),
            Err(e) => {
                crate::log!("render"; "{}: {}", path, e);
                Err(e.to_string())
            }
        };

        if self.commit(path, ticket, outcome) {
            // No subscribers is fine
            let _ = self.updates.send(path.to_owned());
        } else {
            crate::debug!("cache"; "discarded stale render of {} (ticket {})", path, ticket);
        }

        result.map(|_| ())
    }

    fn produce(&self, path: &str) -> Result<String, ArtifactError> {
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_owned(),
            source,
        })?;
        let credential = self
            .credentials
            .current()
            .ok_or(RenderError::MissingCredential)?;
        let html = self.renderer.render(&text, &credential)?;
        crate::debug!("render"; "markdown request done for {}", path);
        Ok(html)
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply an outcome under the write lock. Returns false if a newer render
    /// already landed.
    fn commit(&self, path: &str, ticket: u64, outcome: Result<String, String>) -> bool {
        let mut map = self.artifacts.write();
        match map.get_mut(path) {
            Some(existing) if existing.version > ticket => false,
            Some(existing) => {
                existing.apply(ticket, outcome);
                true
            }
            None => {
                map.insert(
                    path.to_owned(),
                    Artifact::from_outcome(path, ticket, outcome),
                );
                true
            }
        }
    }

    /// Content shown for `path`, or `None` if unknown.
    ///
    /// Tries the exact key, then `/` + key. Absolute keys are requested
    /// through `/files/<path>` URLs without their leading separator.
    pub fn get(&self, path: &str) -> Option<String> {
        let map = self.artifacts.read();
        lookup(&map, path).map(|a| a.body().to_owned())
    }

    /// Full artifact for `path`, using the same lookup as `get`.
    pub fn artifact(&self, path: &str) -> Option<Artifact> {
        let map = self.artifacts.read();
        lookup(&map, path).cloned()
    }

    /// Exact-key membership.
    pub fn contains(&self, path: &str) -> bool {
        self.artifacts.read().contains_key(path)
    }

    /// All keys, ascending.
    pub fn list_paths(&self) -> Vec<String> {
        self.artifacts.read().keys().cloned().collect()
    }

    /// Feed of paths whose render completed. Each value is sent after the
    /// map already holds the new artifact.
    pub fn on_update(&self) -> broadcast::Receiver<String> {
        self.updates.subscribe()
    }
}

fn lookup<'a>(map: &'a BTreeMap<String, Artifact>, path: &str) -> Option<&'a Artifact> {
    map.get(path).or_else(|| map.get(&format!("/{path}")))
}
