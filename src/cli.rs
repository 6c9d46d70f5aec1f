use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use statbridge_config::{CONFIG_ENV, SharedSettings};
use statbridge_core::ToolRegistry;

/// Expose statistics-backend tools to chat hosts and run them from the shell
#[derive(Parser, Debug)]
#[command(name = "statbridge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to statbridge.toml
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the enabled tools
    Tools {
        /// Print full definitions, including parameter schemas, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke a tool by name
    Call(CallArgs),

    /// Inspect or change persisted settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name, e.g. getGarminSteps
    pub tool: String,

    /// Arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,

    /// Update and persist settings
    Set {
        #[arg(long)]
        api_port: Option<u16>,

        #[arg(long)]
        refresh_interval: Option<u64>,
    },
}

pub async fn list_tools(registry: &ToolRegistry, json: bool) -> Result<()> {
    let definitions = registry.definitions().await;
    let mut stdout = std::io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut stdout, &definitions)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let width = definitions
        .iter()
        .map(|definition| definition.name.len())
        .max()
        .unwrap_or_default();
    for definition in &definitions {
        writeln!(
            stdout,
            "{:width$}  {}",
            definition.name, definition.display_name
        )?;
    }
    Ok(())
}

pub async fn call_tool(registry: &ToolRegistry, call: CallArgs) -> Result<()> {
    let args: Value = serde_json::from_str(&call.args)
        .with_context(|| format!("--args is not valid JSON: {}", call.args))?;

    // Pick up a port changed by another process since startup.
    registry.reload().context("failed to reload settings")?;

    let value = registry
        .dispatch_with_progress(&call.tool, args, |message| eprintln!("{message}"))
        .await?;

    match value {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}

pub fn run_settings(settings: &SharedSettings, command: SettingsCommand) -> Result<()> {
    let current = match command {
        SettingsCommand::Show => settings.get(),
        SettingsCommand::Set {
            api_port,
            refresh_interval,
        } => {
            if api_port.is_none() && refresh_interval.is_none() {
                bail!("nothing to set; pass --api-port or --refresh-interval");
            }
            if settings.store().is_none() {
                bail!("no settings store location is available");
            }
            settings.update(|current| {
                if let Some(port) = api_port {
                    current.api_port = port;
                }
                if let Some(interval) = refresh_interval {
                    current.refresh_interval = interval;
                }
            })?
        }
    };

    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}
