use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::broadcast;

use crate::actor::fanout::Fanout;
use crate::actor::watch::WatchActor;

/// Run all actors concurrently.
pub(super) async fn run_actors(
    watch: WatchActor,
    fanout: Arc<Fanout>,
    updates: broadcast::Receiver<String>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let mut watch_handle = tokio::spawn(watch.run());
    let mut fanout_handle = tokio::spawn(fanout.run(updates));

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if watch_handle.is_finished() || fanout_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = &mut watch_handle => {}
            _ = &mut fanout_handle => {}
        }
    }

    watch_handle.abort();
    fanout_handle.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::testing::{Fixture, StubRenderer};

    #[tokio::test]
    async fn test_watch_event_reaches_session() {
        let fx = Fixture::new(StubRenderer::new(), true);
        let path = fx.write("notes.md", "# Hi");
        fx.cache.register_paths([path.clone()]);

        let fanout = Arc::new(Fanout::new(4));
        let session = fanout.connect();
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = crossbeam::channel::bounded(1);
        let watch = WatchActor::new(rx, Arc::clone(&fx.cache));
        let runner = tokio::spawn(run_actors(
            watch,
            Arc::clone(&fanout),
            fx.cache.on_update(),
            Some(stop_rx),
        ));

        std::fs::write(&path, "# Bye").unwrap();
        tx.send(path.clone()).unwrap();

        let delivered = tokio::task::spawn_blocking(move || {
            session.recv_timeout(Duration::from_secs(5))
        })
        .await
        .unwrap();
        assert_eq!(delivered.unwrap(), path);
        assert!(fx.cache.get(&path).unwrap().contains("<h1>Bye</h1>"));

        stop_tx.send(()).unwrap();
        runner.await.unwrap().unwrap();
    }
}
