//! Configuration management for the API
//!
//! Handles loading and validating settings from environment variables.

use anyhow::Result;
use curator_store::StoreConfig;
use curator_store::config::parse_var;
use curator_worker::config::ToolsConfig;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,

    /// Worker loops run inside the API process; 0 leaves execution to
    /// standalone workers
    pub embedded_workers: usize,

    /// How often expired jobs are physically removed
    pub purge_interval: Duration,

    pub store: StoreConfig,

    /// Backends for the tool routes; embedded workers read their own copy
    /// from the pipeline settings
    pub tools: ToolsConfig,
}

impl ApiConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            embedded_workers: 0,
            purge_interval: Duration::from_secs(300),
            store,
            tools: ToolsConfig::default(),
        }
    }

    /// Loads configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(StoreConfig::from_lookup(&lookup)?);
        config.tools = ToolsConfig::from_lookup(&lookup)?;

        if let Some(addr) = lookup("CURATOR_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            config.bind_addr = addr;
        }
        if let Some(workers) = parse_var(&lookup, "EMBEDDED_WORKERS")? {
            config.embedded_workers = workers;
        }
        if let Some(secs) = parse_var(&lookup, "PURGE_INTERVAL")? {
            config.purge_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.purge_interval.is_zero() {
            anyhow::bail!("purge_interval must be greater than 0");
        }

        self.store.validate()?;
        self.tools.validate()
    }

    /// Embedded worker loops are named `api-<n>`
    pub fn worker_names(&self) -> Vec<String> {
        (1..=self.embedded_workers)
            .map(|n| format!("api-{}", n))
            .collect()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
