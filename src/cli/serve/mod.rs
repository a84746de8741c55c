//! Preview server: HTTP facade over the cache plus the live update actors.

mod lifecycle;
mod response;
mod route;

pub use route::App;

use crate::{
    actor::{Coordinator, Fanout},
    cache::Cache,
    config::ViewerConfig,
    credential::CredentialStore,
    debug, log,
    render::GitHubRenderer,
    watch::FsWatcher,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Method, Request, Server};

/// Default WebSocket port for live updates
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Largest form body read from `POST /auth`
const MAX_FORM_BYTES: u64 = 16 * 1024;

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by coordinator after WebSocket server binds successfully
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(DEFAULT_WS_PORT);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port
fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Build every component, register `files`, and serve until Ctrl+C.
pub fn run(config: &ViewerConfig, files: Vec<String>) -> Result<()> {
    let credentials = Arc::new(match &config.auth.token {
        Some(token) => CredentialStore::with_token(token)?,
        None => CredentialStore::new(),
    });

    let watcher = FsWatcher::new().context("failed to initialize file watcher")?;
    let events = watcher
        .events()
        .context("file watcher event feed unavailable")?;

    let cache = Arc::new(Cache::new(
        Arc::clone(&credentials),
        Arc::new(GitHubRenderer::new(&config.render)),
        Arc::new(watcher),
        config.serve.update_buffer,
    ));
    let fanout = Arc::new(Fanout::new(config.serve.session_buffer));

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    let coordinator = Coordinator::new(Arc::clone(&cache), fanout, events)
        .with_ws(config.serve.interface, config.serve.ws_port)
        .with_shutdown_signal(shutdown_rx);
    let actor_handle = lifecycle::spawn_actors(coordinator);

    if credentials.has_credential() {
        lifecycle::spawn_registration(Arc::clone(&cache), files);
    } else {
        // Placeholders only; rendered once a token arrives through /auth
        cache.register_paths(files);
        log!("auth"; "no token found, open http://{}/ to authorize", addr);
    }

    let app = Arc::new(App { cache, credentials });
    run_request_loop(&server, &app, config.serve.workers)?;
    lifecycle::wait_for_shutdown(actor_handle);
    Ok(())
}

fn run_request_loop(server: &Server, app: &Arc<App>, workers: usize) -> Result<()> {
    // A slow render during /auth must not stall other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let app = Arc::clone(app);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &app) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, app: &App) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::send(request, response::Reply::unavailable());
    }

    let mut body = String::new();
    if *request.method() == Method::Post {
        request
            .as_reader()
            .take(MAX_FORM_BYTES)
            .read_to_string(&mut body)
            .context("failed to read request body")?;
    }

    let reply = route::route(app, request.method(), request.url(), &body);
    debug!("serve"; "{} {} -> {}", request.method(), request.url(), reply.status);
    response::send(request, reply)
}
