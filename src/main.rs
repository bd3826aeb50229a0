//! depbot - dependency update automation bot
//!
//! Loads the JSON configuration, validates it, and runs the update
//! orchestrator against the configured repository host.

use anyhow::Context;
use clap::Parser;
use depbot::cli::CliArgs;
use depbot::config::UpdaterConfig;
use depbot::ecosystems::AdapterRegistry;
use depbot::orchestrator::Updater;
use depbot::repository::create_provider;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = UpdaterConfig::from_file(&args.config)?;
    config.apply_defaults();
    config.validate()?;

    let repository_path = match args.repo_path {
        Some(path) => path,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let adapters = AdapterRegistry::with_builtins()?;
    let provider = create_provider(&config)?;
    let updater = Updater::new(config, adapters, provider, repository_path);
    updater.run().await?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
