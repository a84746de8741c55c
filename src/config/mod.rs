//! Viewer configuration management for `markview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── auth       # [auth]
//! │   ├── render     # [render]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   └── error      # ConfigError
//! └── mod.rs         # ViewerConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section    | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `[serve]`  | Listeners and queue sizes                      |
//! | `[render]` | Rendering service endpoint, mode and timeout   |
//! | `[auth]`   | Environment variable that may hold the token   |
//!
//! The file is optional. Without one every section takes its defaults.
//! Precedence: CLI flags over the file over defaults.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{AuthConfig, RenderConfig, RenderMode, ServeConfig};
pub use types::ConfigError;

use crate::{cli::Cli, debug, log};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing markview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Rendering service settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Credential source
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ViewerConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. A missing file is not an
    /// error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                Self::from_path(&path)?
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config
            .auth
            .resolve(cli.token.as_deref(), |name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.serve.ws_port, cli.ws_port.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serve.port == self.serve.ws_port {
            return Err(ConfigError::Validation(format!(
                "[serve] port and ws_port must differ (both {})",
                self.serve.port
            )));
        }
        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "[serve] workers must be at least 1".into(),
            ));
        }
        if !self.render.endpoint.starts_with("http://")
            && !self.render.endpoint.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "[render] endpoint `{}` is not an http(s) URL",
                self.render.endpoint
            )));
        }
        if self.render.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "[render] timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ViewerConfig {
    let (parsed, ignored) = ViewerConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        assert!(ViewerConfig::parse_with_ignored("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.render.mode, RenderMode::Markdown);
        assert_eq!(config.auth.token_env, "GITHUB_TOKEN");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 6000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ViewerConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 6000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("markview.toml");
        fs::write(&path, "[serve]\nport = 6000\nws_port = 6001").unwrap();

        let cli = Cli::try_parse_from([
            "markview",
            "-C",
            path.to_str().unwrap(),
            "-p",
            "7000",
            "--token",
            "abc",
        ])
        .unwrap();
        let config = ViewerConfig::load(&cli).unwrap();

        assert_eq!(config.serve.port, 7000);
        assert_eq!(config.serve.ws_port, 6001);
        assert_eq!(config.auth.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let cli = Cli::try_parse_from(["markview", "-C", path.to_str().unwrap()]).unwrap();

        let config = ViewerConfig::load(&cli).unwrap();
        assert_eq!(config.serve.port, 5277);
    }

    #[test]
    fn test_validate_port_clash() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_endpoint_scheme() {
        let config = test_parse_config("[render]\nendpoint = \"api.github.com/markdown\"");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
