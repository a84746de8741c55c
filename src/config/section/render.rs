//! `[render]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [render]
//! endpoint = "https://api.github.com/markdown"
//! mode = "gfm"               # "markdown" (plain) or "gfm" (issue links, task lists)
//! context = "owner/repo"     # Repository used to resolve gfm references
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Markdown,
    Gfm,
}

/// Rendering service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub endpoint: String,
    pub mode: RenderMode,
    pub context: Option<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.github.com/markdown".to_string(),
            mode: RenderMode::Markdown,
            context: None,
            timeout_secs: 30,
        }
    }
}
