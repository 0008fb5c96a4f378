//! Tool Service
//!
//! Lists the tools the pipeline can call and runs one outside of a job.

use curator_core::dto::job::ValidationError;
use curator_core::dto::tool::{ExecuteTool, ToolExecution, ToolInfo, ToolList};
use tracing::info;

use crate::state::AppState;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("tool '{0}' not found")]
    NotFound(String),
}

/// Every registered tool, sorted by name
pub fn list_tools(state: &AppState) -> ToolList {
    state
        .tools
        .specs()
        .into_iter()
        .map(ToolInfo::from)
        .collect::<Vec<_>>()
        .into()
}

pub fn get_tool(state: &AppState, name: &str) -> Result<ToolInfo, ToolError> {
    state
        .tools
        .spec(name)
        .map(ToolInfo::from)
        .ok_or_else(|| ToolError::NotFound(name.to_string()))
}

/// Runs a tool with the registry's timeout. Unknown tools and tool failures
/// come back as an unsuccessful execution.
pub async fn execute_tool(state: &AppState, req: ExecuteTool) -> Result<ToolExecution, ToolError> {
    req.validate()?;

    info!("Executing tool {}", req.tool_name);
    let outcome = state.tools.invoke(&req.tool_name, req.parameters).await;

    Ok(ToolExecution::new(req.tool_name, outcome))
}
