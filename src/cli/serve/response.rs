//! HTTP response helpers.

use anyhow::{Result, anyhow};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tiny_http::{Header, Request, Response, StatusCode};

use crate::embed::page::{INDEX_HTML, IndexVars};

pub mod mime {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
}

/// Characters escaped when a path key becomes part of a `/files/` link
const LINK: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Transport-independent response.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub location: Option<String>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            location: None,
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, mime::HTML, body)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, mime::PLAIN, body)
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            location: Some(location.to_owned()),
            ..Self::new(302, mime::PLAIN, "")
        }
    }

    pub fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }

    pub fn unavailable() -> Self {
        Self::text(503, "503 Service Unavailable")
    }
}

pub fn send(request: Request, reply: Reply) -> Result<()> {
    let mut response = Response::from_string(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(make_header("Content-Type", reply.content_type)?);
    if let Some(location) = &reply.location {
        response.add_header(make_header("Location", location)?);
    }
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}

/// Index page listing `paths` as `/files/` links.
pub fn render_index(paths: &[String]) -> String {
    let items = paths
        .iter()
        .map(|path| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                file_link(path),
                escape_html(path)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    INDEX_HTML.render(&IndexVars { items: &items })
}

/// `/files` URL for a path key. Absolute keys keep a single separator.
pub fn file_link(path: &str) -> String {
    let encoded = utf8_percent_encode(path, LINK);
    if path.starts_with('/') {
        format!("/files{encoded}")
    } else {
        format!("/files/{encoded}")
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
