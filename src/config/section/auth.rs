//! `[auth]` section configuration.
//!
//! ```toml
//! [auth]
//! token_env = "GITHUB_TOKEN"  # Environment variable holding a token
//! ```
//!
//! `--token` on the command line takes precedence over the environment.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_env: String,

    /// Token resolved from CLI or environment (internal use only)
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".to_string(),
            token: None,
        }
    }
}

impl AuthConfig {
    /// Pick the CLI token, else the value of `token_env` from `env`.
    pub fn resolve(&mut self, cli_token: Option<&str>, env: impl Fn(&str) -> Option<String>) {
        self.token = cli_token
            .map(str::to_owned)
            .or_else(|| env(&self.token_env))
            .filter(|t| !t.trim().is_empty());
    }
}
