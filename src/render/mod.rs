//! Rendering client: markdown text in, HTML out.
//!
//! # Module Structure
//!
//! - `github` - GitHub Markdown API client
//! - `envelope` - Fixed presentation wrapper applied to every rendered page

mod envelope;
mod github;

pub use envelope::wrap;
pub use github::GitHubRenderer;

use thiserror::Error;

use crate::credential::Credential;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Service answered with a non-success status. `message` is its own reason.
    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("render request failed: {0}")]
    Transport(String),

    #[error("no credential available for rendering")]
    MissingCredential,
}

impl From<ureq::Error> for RenderError {
    fn from(err: ureq::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Converts raw document text to HTML.
///
/// Implementations block the calling thread for the duration of the call.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str, credential: &Credential) -> Result<String, RenderError>;
}
