//! Fan-out Actor - viewer sessions and broadcast
//!
//! Bridges the cache update feed to every connected viewer session.
//!
//! ```text
//! Cache::on_update --path--> Fanout --try_send--> Session (bounded queue) --> viewer
//! ```
//!
//! Delivery is best-effort: each session owns a bounded queue and a full
//! queue drops the update for that session only. The producer and the other
//! sessions never wait on a slow viewer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

pub type SessionId = u64;

/// One connected viewer. Dropping it disconnects on the next broadcast.
pub struct Session {
    id: SessionId,
    rx: Receiver<String>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

/// Registry of live sessions.
pub struct Fanout {
    sessions: RwLock<FxHashMap<SessionId, Sender<String>>>,
    next_id: AtomicU64,
    /// Per-session queue capacity
    buffer: usize,
}

impl Fanout {
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: RwLock::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a new session. It only sees updates broadcast from now on.
    pub fn connect(&self) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = channel::bounded(self.buffer);
        let mut sessions = self.sessions.write();
        sessions.insert(id, tx);
        crate::debug!("ws"; "session {} connected (total: {})", id, sessions.len());
        Session { id, rx }
    }

    /// Remove a session. Returns whether it was still registered.
    pub fn disconnect(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            crate::debug!("ws"; "session {} disconnected", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `path` to every session registered at call time.
    ///
    /// Iterates a snapshot, so sessions may connect or disconnect meanwhile.
    /// Returns the number of sessions that accepted the update.
    pub fn broadcast(&self, path: &str) -> usize {
        let snapshot: Vec<(SessionId, Sender<String>)> = self
            .sessions
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        if snapshot.is_empty() {
            crate::debug!("ws"; "no sessions connected");
            return 0;
        }

        let mut delivered = 0;
        for (id, tx) in snapshot {
            match tx.try_send(path.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    crate::debug!("ws"; "session {} is behind, dropped update for {}", id, path);
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.disconnect(id);
                }
            }
        }
        crate::debug!("ws"; "broadcast {} to {} sessions", path, delivered);
        delivered
    }

    /// Forward every cache update to the sessions until the feed closes.
    pub async fn run(self: Arc<Self>, mut updates: broadcast::Receiver<String>) {
        loop {
            match updates.recv().await {
                Ok(path) => {
                    self.broadcast(&path);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    crate::debug!("ws"; "fan-out lagged, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        crate::debug!("ws"; "update feed closed");
    }
}
