//! CLI argument parsing module for depbot

use clap::Parser;
use std::path::PathBuf;

/// Dependency update automation bot
#[derive(Parser, Debug, Clone)]
#[command(name = "depbot", version, about = "Dependency update automation bot")]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Path to the repository working copy (default: current directory)
    #[arg(short, long)]
    pub repo_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}
