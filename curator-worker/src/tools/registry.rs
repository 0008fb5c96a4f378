use curator_core::domain::ToolOutcome;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{KnowledgeBaseTool, MediaKind, MediaServer, MediaTool, Tool};
use crate::config::ToolsConfig;
use crate::generation::ToolSpec;

/// Name-indexed set of tools sharing one per-call timeout
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: BTreeMap::new(),
            timeout,
        }
    }

    /// Registers every tool whose backend is configured
    pub fn from_config(config: &ToolsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let mut registry = Self::new(config.timeout);

        if let Some(url) = &config.knowledge_base_url {
            registry.register(Arc::new(KnowledgeBaseTool::new(client.clone(), url)));
        }

        for kind in MediaKind::ALL {
            let specialised = match kind {
                MediaKind::Image => &config.image_server_url,
                MediaKind::Speech => &config.tts_server_url,
                MediaKind::Video => &config.video_server_url,
            };

            let servers: Vec<MediaServer> = [
                config
                    .media_server_url
                    .as_ref()
                    .map(|url| MediaServer::new("media_generation", url)),
                specialised
                    .as_ref()
                    .map(|url| MediaServer::new(kind.server_name(), url)),
            ]
            .into_iter()
            .flatten()
            .collect();

            if !servers.is_empty() {
                registry.register(Arc::new(MediaTool::new(kind, servers, client.clone())));
            }
        }

        if registry.is_empty() {
            info!("No tool backends configured; stages will run without tools");
        } else {
            info!("Registered tools: {}", registry.names().join(", "));
        }

        Ok(registry)
    }

    /// Adds a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub fn spec(&self, name: &str) -> Option<ToolSpec> {
        self.tools.get(name).map(|tool| tool.spec())
    }

    /// Runs a tool by name. Unknown tools, errors and timeouts all come back
    /// as a failed outcome.
    pub async fn invoke(&self, name: &str, parameters: JsonValue) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            warn!("Model requested unknown tool '{}'", name);
            return ToolOutcome::failed(format!("unknown tool '{}'", name));
        };

        debug!("Invoking tool {} with {}", name, parameters);

        match tokio::time::timeout(self.timeout, tool.call(parameters)).await {
            Ok(Ok(result)) => ToolOutcome::ok(result),
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", name, e);
                ToolOutcome::failed(e.to_string())
            }
            Err(_) => {
                warn!("Tool {} timed out after {:?}", name, self.timeout);
                ToolOutcome::failed(format!("timed out after {}s", self.timeout.as_secs_f64()))
            }
        }
    }
}
