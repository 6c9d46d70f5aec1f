//! statbridge - function tools backed by a local statistics service

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use statbridge_config::{BridgeConfig, SharedSettings};
use statbridge_core::ToolRegistry;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = BridgeConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let settings = match config.settings_store() {
        Some(store) => SharedSettings::with_store(store).context("failed to load settings")?,
        None => SharedSettings::default(),
    };
    debug!(api_port = settings.api_port(), "Settings ready");

    match cli.command {
        Command::Settings(command) => cli::run_settings(&settings, command),
        Command::Tools { json } => {
            let registry = build_registry(settings, &config).await?;
            cli::list_tools(&registry, json).await
        }
        Command::Call(call) => {
            let registry = build_registry(settings, &config).await?;
            cli::call_tool(&registry, call).await
        }
    }
}

async fn build_registry(settings: SharedSettings, config: &BridgeConfig) -> Result<ToolRegistry> {
    let registry = ToolRegistry::new(settings);
    statbridge_tools::register_default_tools(&registry, config).await?;
    Ok(registry)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statbridge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
