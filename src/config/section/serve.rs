//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! ws_port = 35729             # WebSocket port for live updates
//! workers = 4                 # HTTP request threads
//! session_buffer = 16         # Queued updates per viewer before dropping
//! update_buffer = 256         # Capacity of the cache update feed
//! ```
//!
//! Both ports are base ports: if taken, the next free port (up to 10 tries)
//! is used.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port number.
    pub ws_port: u16,

    /// Threads serving HTTP requests.
    pub workers: usize,

    /// Per-viewer queue capacity.
    pub session_buffer: usize,

    /// Cache update feed capacity.
    pub update_buffer: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            ws_port: 35729,
            workers: 4,
            session_buffer: 16,
            update_buffer: 256,
        }
    }
}
