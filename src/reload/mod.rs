//! Live update channel.
//!
//! - `message` - JSON messages pushed to viewers
//! - `server` - WebSocket listener and per-session delivery

pub mod message;
pub mod server;
