//! Tool command handlers

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use curator_client::CuratorClient;
use curator_core::dto::tool::{ExecuteTool, ToolInfo};
use serde_json::{Map, Value as JsonValue};

use super::parse_key_value;
use crate::config::Config;

/// Tool subcommands
#[derive(Subcommand)]
pub enum ToolCommands {
    /// List the tools the pipeline can call
    List,
    /// Show a tool's description and parameters
    Show {
        /// Tool name
        name: String,
    },
    /// Run a tool directly
    Run {
        /// Tool name
        name: String,

        /// Parameter as key=value (repeatable); JSON values are kept as JSON
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

/// Handle tool commands
pub async fn handle_tool_command(command: ToolCommands, config: &Config) -> Result<()> {
    let client = CuratorClient::new(&config.api_url);

    match command {
        ToolCommands::List => list_tools(&client).await,
        ToolCommands::Show { name } => match client.get_tool(&name).await {
            Ok(tool) => {
                print_tool(&tool);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                bail!("No tool named '{}'; `curator tool list` shows the available ones", name)
            }
            Err(e) => Err(e.into()),
        },
        ToolCommands::Run { name, params } => run_tool(&client, name, &params).await,
    }
}

async fn list_tools(client: &CuratorClient) -> Result<()> {
    let list = client.list_tools().await?;

    if list.tools.is_empty() {
        println!("{}", "No tools configured.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} tool(s):", list.count).bold());
    for tool in &list.tools {
        println!("  {} {}", "▸".cyan(), tool.name.cyan());
        println!("    {}", tool.description.dimmed());
    }

    Ok(())
}

async fn run_tool(client: &CuratorClient, name: String, params: &[String]) -> Result<()> {
    let mut parameters = Map::new();
    for param in params {
        let (key, value) = parse_key_value(param)?;
        parameters.insert(key, value);
    }

    let execution = client
        .execute_tool(&ExecuteTool::new(name, JsonValue::Object(parameters)))
        .await
        .context("Failed to run tool")?;

    if execution.success {
        println!("{} {}", "✓".green(), execution.tool_name);
        if let Some(result) = &execution.result {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    } else {
        println!("{} {}", "✗".red(), execution.tool_name);
        if let Some(error) = &execution.error {
            println!("{}", error.red());
        }
    }

    Ok(())
}

fn print_tool(tool: &ToolInfo) {
    println!("{}", tool.name.cyan().bold());
    println!("  {}", tool.description);

    let Some(properties) = tool.input_schema["properties"].as_object() else {
        return;
    };
    let required: Vec<&str> = tool.input_schema["required"]
        .as_array()
        .map(|r| r.iter().filter_map(JsonValue::as_str).collect())
        .unwrap_or_default();

    println!("\n{}", "Parameters:".bold());
    for (name, schema) in properties {
        let kind = schema["type"].as_str().unwrap_or("any");
        let marker = if required.contains(&name.as_str()) {
            " (required)".yellow()
        } else {
            "".normal()
        };
        println!("  {} {}{}", name, kind.dimmed(), marker);
    }
}
