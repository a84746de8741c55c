//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

/// Live markdown preview server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Markdown files to register at startup
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: markview.toml, optional)
    #[arg(short = 'C', long, default_value = "markview.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// HTTP port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// WebSocket port for live updates
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// GitHub token (overrides the environment variable named in [auth])
    #[arg(long)]
    pub token: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Startup files as absolute path keys.
    ///
    /// Not canonicalized: symlinked paths stay as typed, and a missing file
    /// still gets a key so its failure is visible in the index.
    pub fn file_keys(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|path| {
                std::path::absolute(path)
                    .unwrap_or_else(|_| path.clone())
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }
}
