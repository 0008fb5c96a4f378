//! Health command

use anyhow::{Context, Result};
use colored::*;
use curator_client::CuratorClient;
use curator_core::dto::health::HealthStatus;

use crate::config::Config;

pub async fn show_health(config: &Config) -> Result<()> {
    let client = CuratorClient::new(&config.api_url);
    let report = client
        .health()
        .await
        .with_context(|| format!("Failed to reach API at {}", config.api_url))?;

    let status = match report.status {
        HealthStatus::Healthy => report.status.as_str().green(),
        HealthStatus::Degraded => report.status.as_str().yellow(),
        HealthStatus::Unhealthy => report.status.as_str().red(),
    };

    println!("{} {}", "Status:".bold(), status);
    println!("  Store:       {}", connected(report.store_connected));
    println!("  Queue:       {}", connected(report.queue_connected));
    if let Some(depth) = report.queue_depth {
        println!("  Queue depth: {}", depth);
    }
    println!(
        "  Checked at:  {}",
        report
            .timestamp
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );

    Ok(())
}

fn connected(ok: bool) -> ColoredString {
    if ok {
        "✓ connected".green()
    } else {
        "✗ unreachable".red()
    }
}
