//! Actor Coordinator - wires up the live update actor system
//!
//! The Coordinator is a thin orchestrator that:
//! - Starts the WebSocket listener that feeds viewer sessions
//! - Wires the watcher feed into the cache and the cache feed into the fan-out
//! - Runs the actors until shutdown

mod runtime;

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fanout::Fanout;
use super::watch::WatchActor;
use crate::cache::Cache;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    cache: Arc<Cache>,
    fanout: Arc<Fanout>,
    events: mpsc::UnboundedReceiver<String>,
    ws: Option<(IpAddr, u16)>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        cache: Arc<Cache>,
        fanout: Arc<Fanout>,
        events: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            cache,
            fanout,
            events,
            ws: None,
            shutdown_rx: None,
        }
    }

    /// Set WebSocket interface and base port.
    pub fn with_ws(mut self, interface: IpAddr, port: u16) -> Self {
        self.ws = Some((interface, port));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(self) -> Result<()> {
        if let Some((interface, port)) = self.ws {
            match crate::reload::server::start_ws_server(interface, port, Arc::clone(&self.fanout))
            {
                Ok(actual_port) => crate::cli::serve::set_actual_ws_port(actual_port),
                Err(e) => crate::log!("actor"; "websocket server failed: {}", e),
            }
        }

        // Subscribe before any watch-driven render can complete
        let updates = self.cache.on_update();
        let watch = WatchActor::new(self.events, Arc::clone(&self.cache));

        crate::debug!("actor"; "start");
        runtime::run_actors(watch, self.fanout, updates, self.shutdown_rx).await?;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
