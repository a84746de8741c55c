//! WebSocket Server for Live Updates
//!
//! Each accepted client gets a fan-out session and a delivery thread that
//! forwards queued paths as `update` messages. The socket is switched to
//! non-blocking after the handshake so the thread can poll for close frames
//! between deliveries.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::RecvTimeoutError;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::LiveMessage;
use crate::actor::fanout::{Fanout, Session};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// How long a delivery thread waits for an update before polling the socket
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Start the WebSocket listener. Returns the port actually bound.
pub fn start_ws_server(interface: IpAddr, base_port: u16, fanout: Arc<Fanout>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;
    crate::debug!("ws"; "ws://{}:{}", interface, actual_port);

    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("ws"; "client connected: {}", addr);
                    let fanout = Arc::clone(&fanout);
                    std::thread::spawn(move || serve_client(stream, &fanout));
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Handshake, register a session, deliver until either side goes away.
fn serve_client(stream: TcpStream, fanout: &Fanout) {
    // Blocking during handshake
    let _ = stream.set_nonblocking(false);
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("ws"; "handshake failed: {}", e);
            return;
        }
    };

    if let Err(e) = ws.send(Message::Text(LiveMessage::connected().to_json().into())) {
        crate::log!("ws"; "failed to send connected message: {}", e);
        return;
    }
    let _ = ws.get_ref().set_nonblocking(true);

    let session = fanout.connect();
    deliver(&mut ws, &session);
    fanout.disconnect(session.id());
    let _ = ws.close(None);
    let _ = ws.flush();
}

fn deliver(ws: &mut WebSocket<TcpStream>, session: &Session) {
    loop {
        if crate::core::is_shutdown() {
            return;
        }
        match session.recv_timeout(POLL_INTERVAL) {
            Ok(path) => {
                let msg = Message::Text(LiveMessage::update(path).to_json().into());
                match ws.send(msg) {
                    Ok(()) => {}
                    // Frame stays queued inside tungstenite; flushed on the next write
                    Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {}
                    Err(e) => {
                        crate::debug!("ws"; "session {} send failed: {}", session.id(), e);
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !poll_open(ws) {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Non-blocking read: false once the client closed or the socket failed.
fn poll_open(ws: &mut WebSocket<TcpStream>) -> bool {
    loop {
        match ws.read() {
            Ok(Message::Close(_)) => return false,
            Ok(_) => continue,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                return true;
            }
            Err(_) => return false,
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn read_text(ws: &mut WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>) -> String {
        loop {
            if let Message::Text(text) = ws.read().unwrap() {
                return text.as_str().to_owned();
            }
        }
    }

    fn wait_for_sessions(fanout: &Fanout, n: usize) {
        for _ in 0..100 {
            if fanout.len() == n {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("expected {n} sessions, have {}", fanout.len());
    }

    #[test]
    fn test_bind_retry_skips_taken_port() {
        let (first, port) = try_bind_port(LOCALHOST, 0, 1).unwrap();
        let (_second, other) = try_bind_port(LOCALHOST, port, 3).unwrap();
        assert_ne!(port, other);
        drop(first);
    }

    #[test]
    fn test_client_receives_updates() {
        let fanout = Arc::new(Fanout::new(8));
        let port = start_ws_server(LOCALHOST, 0, Arc::clone(&fanout)).unwrap();

        let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        let hello: serde_json::Value = serde_json::from_str(&read_text(&mut ws)).unwrap();
        assert_eq!(hello["type"], "connected");

        wait_for_sessions(&fanout, 1);
        fanout.broadcast("/docs/notes.md");

        let update: serde_json::Value = serde_json::from_str(&read_text(&mut ws)).unwrap();
        assert_eq!(update["type"], "update");
        assert_eq!(update["path"], "/docs/notes.md");

        ws.close(None).unwrap();
        wait_for_sessions(&fanout, 0);
    }
}
