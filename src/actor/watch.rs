//! Watch Actor
//!
//! Turns watcher events into re-renders: event -> render -> publish, one
//! event at a time. Events already queued when a render finishes are folded
//! into one batch with duplicate paths collapsed; the batch keeps
//! first-seen order.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cache::Cache;

pub struct WatchActor {
    events: mpsc::UnboundedReceiver<String>,
    cache: Arc<Cache>,
}

impl WatchActor {
    pub fn new(events: mpsc::UnboundedReceiver<String>, cache: Arc<Cache>) -> Self {
        Self { events, cache }
    }

    /// Run until the event stream closes.
    pub async fn run(mut self) {
        while let Some(first) = self.events.recv().await {
            for path in self.drain_pending(first) {
                self.refresh(path).await;
            }
        }
        crate::debug!("watch"; "event stream closed");
    }

    /// `first` plus everything already queued, duplicates removed.
    fn drain_pending(&mut self, first: String) -> Vec<String> {
        let mut batch = vec![first];
        while let Ok(next) = self.events.try_recv() {
            if !batch.contains(&next) {
                batch.push(next);
            }
        }
        batch
    }

    async fn refresh(&self, path: String) {
        if !self.cache.contains(&path) {
            crate::debug!("watch"; "ignoring unregistered path: {}", path);
            return;
        }

        // The render blocks on file I/O and the remote call
        let cache = Arc::clone(&self.cache);
        let key = path.clone();
        match tokio::task::spawn_blocking(move || cache.render(&key)).await {
            Ok(Ok(())) => crate::log!("watch"; "rendered {}", path),
            // Reason is stored on the artifact and logged by the cache
            Ok(Err(e)) => crate::debug!("watch"; "render of {} failed: {}", path, e),
            Err(e) => crate::log!("watch"; "render task for {} failed: {}", path, e),
        }
    }
}
