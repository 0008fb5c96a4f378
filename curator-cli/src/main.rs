//! Curator CLI
//!
//! Command-line interface for submitting and following creative workflow jobs.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Curator creative workflow CLI", long_about = None)]
struct Cli {
    /// API URL
    #[arg(long, env = "CURATOR_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
    };

    handle_command(cli.command, &config).await
}
