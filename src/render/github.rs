//! GitHub Markdown API client.
//!
//! `POST /markdown` with `{"text", "mode", "context"}` returns raw HTML.

use std::time::Duration;

use serde::Serialize;
use ureq::Agent;

use super::{RenderError, Renderer};
use crate::config::{RenderConfig, RenderMode};
use crate::credential::Credential;

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("markview/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct MarkdownRequest<'a> {
    text: &'a str,
    mode: RenderMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

pub struct GitHubRenderer {
    agent: Agent,
    endpoint: String,
    mode: RenderMode,
    context: Option<String>,
}

impl GitHubRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: config.endpoint.clone(),
            mode: config.mode,
            context: config.context.clone(),
        }
    }

    fn body(&self, text: &str) -> Result<String, RenderError> {
        let request = MarkdownRequest {
            text,
            mode: self.mode,
            context: self.context.as_deref(),
        };
        serde_json::to_string(&request).map_err(|e| RenderError::Transport(e.to_string()))
    }
}

impl Renderer for GitHubRenderer {
    fn render(&self, text: &str, credential: &Credential) -> Result<String, RenderError> {
        let body = self.body(text)?;

        let request = self
            .agent
            .post(&self.endpoint)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json");
        let mut response = credential.authorize(request).send(body.as_str())?;

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        crate::debug!("render"; "markdown request done ({})", status);

        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(RenderError::Service {
                status,
                message: service_message(&text),
            })
        }
    }
}

/// The service's reason: the JSON `message` field if present, else the body.
fn service_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}
