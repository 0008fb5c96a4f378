//! Tool registry endpoints

use crate::CuratorClient;
use crate::error::Result;
use curator_core::dto::tool::{ExecuteTool, ToolExecution, ToolInfo, ToolList};

impl CuratorClient {
    /// List the tools the pipeline can call
    pub async fn list_tools(&self) -> Result<ToolList> {
        let url = format!("{}/api/v1/mcp/tools", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get one tool's description and parameter schema
    pub async fn get_tool(&self, name: &str) -> Result<ToolInfo> {
        let url = format!("{}/api/v1/mcp/tools/{}", self.base_url, name);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Run a tool directly; a failing tool is an `Ok` with `success: false`
    pub async fn execute_tool(&self, req: &ExecuteTool) -> Result<ToolExecution> {
        let url = format!("{}/api/v1/mcp/tools/execute", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }
}
