//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Turn a git history into a step-by-step coding tutorial
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: nearest diffbook.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile tutorials into a zip archive
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Watch a tutorial directory and push live updates to viewers
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: WatchArgs,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Repository path (default: discovered from the current directory)
    #[arg(short, long, env = "GIT_DIR", value_hint = clap::ValueHint::DirPath)]
    pub repo: Option<PathBuf>,

    /// Archive to write
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Tip revisions, one tutorial each
    #[arg(value_name = "REVISION", default_value = "HEAD")]
    pub revisions: Vec<String>,
}

/// Watch command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    /// Repository path (default: discovered from DIRNAME)
    #[arg(short, long, env = "GIT_DIR", value_hint = clap::ValueHint::DirPath)]
    pub repo: Option<PathBuf>,

    /// Tip revision holding the tutorial's commits
    #[arg(short = 'b', long = "branch", value_name = "REVISION", default_value = "HEAD")]
    pub revision: String,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Tutorial directory to watch
    #[arg(value_name = "DIRNAME", value_hint = clap::ValueHint::DirPath)]
    pub dirname: PathBuf,
}
