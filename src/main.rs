//! Markview - live preview server for markdown files.

mod actor;
mod cache;
mod cli;
mod config;
mod core;
mod credential;
mod embed;
mod logger;
mod reload;
mod render;
mod watch;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::ViewerConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ViewerConfig::load(&cli)?;
    cli::serve::run(&config, cli.file_keys())
}
