//! Actor System for Live Updates
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsWatcher --path--> WatchActor --render--> Cache --path--> FanoutActor --> Sessions
//!  (notify)          (sequential)           (map)           (broadcast)    (per viewer)
//! ```
//!
//! # Module Structure
//!
//! - `watch` - Consumes watcher events, re-renders one path at a time
//! - `fanout` - Viewer session registry and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fanout;
pub mod watch;

pub use coordinator::Coordinator;
pub use fanout::{Fanout, Session, SessionId};
pub use watch::WatchActor;
