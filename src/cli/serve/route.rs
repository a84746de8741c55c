//! Request routing, independent of the HTTP transport.
//!
//! | Route                          | Response                              |
//! |--------------------------------|---------------------------------------|
//! | `GET /`                        | file index, or the token form         |
//! | `POST /auth`                   | install token, render all, go to `/`  |
//! | `GET /files/<path>`            | rendered page for a registered path   |
//! | `GET /css/github-markdown.css` | embedded stylesheet                   |
//! | `GET /js/main.js`              | live update client                    |

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tiny_http::Method;
use url::form_urlencoded;

use super::response::{Reply, mime, render_index};
use crate::cache::{ArtifactStatus, Cache};
use crate::credential::CredentialStore;
use crate::embed::assets::{MAIN_JS, MARKDOWN_CSS, MainJsVars};
use crate::embed::page::AUTH_HTML;
use crate::log;

const FILES_PREFIX: &str = "/files/";

/// State shared by all request handlers.
pub struct App {
    pub cache: Arc<Cache>,
    pub credentials: Arc<CredentialStore>,
}

pub fn route(app: &App, method: &Method, url: &str, body: &str) -> Reply {
    let path = url.split_once('?').map_or(url, |(path, _)| path);

    match (method, path) {
        (Method::Get, "/") => index(app),
        (Method::Post, "/auth") => authorize(app, body),
        (Method::Get, "/css/github-markdown.css") => Reply::new(200, mime::CSS, MARKDOWN_CSS),
        (Method::Get, "/js/main.js") => Reply::new(
            200,
            mime::JAVASCRIPT,
            MAIN_JS.render(&MainJsVars {
                ws_port: super::get_actual_ws_port(),
            }),
        ),
        (Method::Get, p) if p.starts_with(FILES_PREFIX) => file(app, &p[FILES_PREFIX.len()..]),
        _ => Reply::not_found(),
    }
}

fn index(app: &App) -> Reply {
    if !app.credentials.has_credential() {
        return Reply::html(AUTH_HTML);
    }
    Reply::html(render_index(&app.cache.list_paths()))
}

fn authorize(app: &App, body: &str) -> Reply {
    let token = form_field(body, "token").unwrap_or_default();
    if let Err(e) = app.credentials.install(&token) {
        return Reply::text(500, e.to_string());
    }
    log!("auth"; "token installed, rendering {} file(s)", app.cache.list_paths().len());
    app.cache.register_all();
    Reply::redirect("/")
}

fn file(app: &App, raw: &str) -> Reply {
    let path = percent_decode_str(raw).decode_utf8_lossy();
    let Some(artifact) = app.cache.artifact(&path) else {
        return Reply::text(404, format!("`{path}` page not found"));
    };
    match artifact.status() {
        ArtifactStatus::Failed(reason) => Reply::text(500, reason.clone()),
        _ => Reply::html(artifact.content()),
    }
}

/// Value of `name` in an `application/x-www-form-urlencoded` body.
fn form_field(body: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
