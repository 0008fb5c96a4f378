//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod health;
mod job;
mod tool;

pub use job::JobCommands;
pub use tool::ToolCommands;

use anyhow::{Result, anyhow};
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Inspect and run the tools available to the pipeline
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },
    /// Show API, store and queue health
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Tool { command } => tool::handle_tool_command(command, config).await,
        Commands::Health => health::show_health(config).await,
    }
}

/// Splits `key=value`; the value is JSON when it parses as JSON, a string
/// otherwise
fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("'{}' must look like key=value", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("'{}' has an empty key", raw));
    }

    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));

    Ok((key.to_string(), value))
}
