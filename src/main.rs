//! diffbook - compile a git history into a step-by-step coding tutorial.

mod actor;
mod bundle;
mod cli;
mod config;
mod core;
mod diff;
mod history;
mod html;
mod logger;
mod render;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DiffbookConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = DiffbookConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { args } => cli::build::build_archive(args, &config).map(|_| ()),
        Commands::Watch { args } => cli::watch::watch_tutorial(args, &config),
    }
}
