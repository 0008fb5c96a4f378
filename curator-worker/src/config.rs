//! Worker configuration
//!
//! Defines everything a worker process needs: its identity, how many loops
//! to run, the store/queue connection, and the pipeline settings (model,
//! retries, tool backends). The pipeline part is also used by the API when
//! it runs embedded workers.

use anyhow::Result;
use curator_store::config::{StoreBackend, StoreConfig, parse_var};
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Worker process configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Prefix of every consumer name; loops are `<worker_id>-<n>`
    pub worker_id: String,

    /// Number of independent sequential worker loops
    pub concurrency: usize,

    pub store: StoreConfig,

    pub pipeline: PipelineConfig,
}

impl WorkerConfig {
    pub fn new(store: StoreConfig, pipeline: PipelineConfig) -> Self {
        Self {
            worker_id: uuid::Uuid::new_v4().to_string(),
            concurrency: 1,
            store,
            pipeline,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - WORKER_ID (optional, default: random UUID)
    /// - WORKER_CONCURRENCY (optional, default: 1)
    /// - plus everything read by [`StoreConfig::from_env`] and
    ///   [`PipelineConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store = StoreConfig::from_lookup(&lookup)?;
        let pipeline = PipelineConfig::from_lookup(&lookup)?;
        let mut config = Self::new(store, pipeline);

        if let Some(worker_id) = lookup("WORKER_ID") {
            config.worker_id = worker_id;
        }
        if let Some(concurrency) = parse_var(&lookup, "WORKER_CONCURRENCY")? {
            config.concurrency = concurrency;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_id.trim().is_empty() {
            anyhow::bail!("worker_id cannot be empty");
        }

        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }

        self.store.validate()?;
        self.pipeline.validate()
    }

    /// Validation for a worker running in its own process, which can only
    /// reach jobs through a shared backend
    pub fn validate_standalone(&self) -> Result<()> {
        self.validate()?;

        if self.store.backend == StoreBackend::Memory {
            anyhow::bail!(
                "the memory backend cannot be shared between processes; \
                 set STORE_BACKEND=postgres or run workers embedded in the API"
            );
        }

        Ok(())
    }

    /// Consumer name of loop `n`
    pub fn consumer_name(&self, n: usize) -> String {
        format!("{}-{}", self.worker_id, n)
    }
}

/// Pipeline executor settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub generation: GenerationConfig,
    pub tools: ToolsConfig,

    /// Tool-use round trips allowed per stage before the model must answer
    pub max_tool_rounds: usize,
}

impl PipelineConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            generation: GenerationConfig::new(api_key),
            tools: ToolsConfig::default(),
            max_tool_rounds: 4,
        }
    }

    /// Expected environment variables:
    /// - ANTHROPIC_API_KEY (required)
    /// - ANTHROPIC_BASE_URL, GENERATION_MODEL, GENERATION_MAX_TOKENS,
    ///   GENERATION_TEMPERATURE, GENERATION_TIMEOUT (seconds),
    ///   GENERATION_MAX_RETRIES, MAX_TOOL_ROUNDS
    /// - TOOL_TIMEOUT (seconds), KNOWLEDGE_BASE_URL, MCP_MEDIA_SERVER_URL,
    ///   MCP_IMAGE_SERVER_URL, MCP_TTS_SERVER_URL, MCP_VIDEO_SERVER_URL
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;

        let mut config = Self::new(api_key);
        let generation = &mut config.generation;

        if let Some(base_url) = non_empty(&lookup, "ANTHROPIC_BASE_URL") {
            generation.base_url = base_url;
        }
        if let Some(model) = non_empty(&lookup, "GENERATION_MODEL") {
            generation.model = model;
        }
        if let Some(max_tokens) = parse_var(&lookup, "GENERATION_MAX_TOKENS")? {
            generation.max_tokens = max_tokens;
        }
        if let Some(temperature) = parse_var(&lookup, "GENERATION_TEMPERATURE")? {
            generation.temperature = temperature;
        }
        if let Some(secs) = parse_var(&lookup, "GENERATION_TIMEOUT")? {
            generation.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var(&lookup, "GENERATION_MAX_RETRIES")? {
            generation.max_retries = retries;
        }
        if let Some(rounds) = parse_var(&lookup, "MAX_TOOL_ROUNDS")? {
            config.max_tool_rounds = rounds;
        }

        config.tools = ToolsConfig::from_lookup(&lookup)?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.generation.validate()?;
        self.tools.validate()
    }
}

/// Model settings
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retries of transient failures before the job is failed
    pub max_retries: u32,
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            timeout: Duration::from_secs(120),
            max_retries: 3,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("api_key cannot be empty");
        }

        check_url("base_url", &self.base_url)?;

        if self.model.trim().is_empty() {
            anyhow::bail!("model cannot be empty");
        }

        if self.max_tokens == 0 {
            anyhow::bail!("max_tokens must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            anyhow::bail!("temperature must be between 0.0 and 1.0");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("generation timeout must be greater than 0");
        }

        Ok(())
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Tool backends; a tool is only offered to the model when its backend is set
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub timeout: Duration,
    pub knowledge_base_url: Option<String>,
    /// General media server, tried before the specialised ones
    pub media_server_url: Option<String>,
    pub image_server_url: Option<String>,
    pub tts_server_url: Option<String>,
    pub video_server_url: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            knowledge_base_url: None,
            media_server_url: None,
            image_server_url: None,
            tts_server_url: None,
            video_server_url: None,
        }
    }
}

impl ToolsConfig {
    /// Reads TOOL_TIMEOUT (seconds) and the tool backend URLs. Needs no model
    /// credentials, so the API can serve the tool routes without them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut tools = Self::default();

        if let Some(secs) = parse_var(&lookup, "TOOL_TIMEOUT")? {
            tools.timeout = Duration::from_secs(secs);
        }
        tools.knowledge_base_url = non_empty(&lookup, "KNOWLEDGE_BASE_URL");
        tools.media_server_url = non_empty(&lookup, "MCP_MEDIA_SERVER_URL");
        tools.image_server_url = non_empty(&lookup, "MCP_IMAGE_SERVER_URL");
        tools.tts_server_url = non_empty(&lookup, "MCP_TTS_SERVER_URL");
        tools.video_server_url = non_empty(&lookup, "MCP_VIDEO_SERVER_URL");

        Ok(tools)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            anyhow::bail!("tool timeout must be greater than 0");
        }

        let urls = [
            ("knowledge_base_url", &self.knowledge_base_url),
            ("media_server_url", &self.media_server_url),
            ("image_server_url", &self.image_server_url),
            ("tts_server_url", &self.tts_server_url),
            ("video_server_url", &self.video_server_url),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                check_url(name, url)?;
            }
        }

        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_url(name: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(())
}
