//! Tool API Handlers
//!
//! Inspect the registered tools and run one directly.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use curator_core::dto::tool::{ExecuteTool, ToolExecution, ToolInfo, ToolList};

use crate::api::error::ApiResult;
use crate::service::tool_service;
use crate::state::AppState;

/// GET /api/v1/mcp/tools
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolList> {
    Json(tool_service::list_tools(&state))
}

/// GET /api/v1/mcp/tools/{tool_name}
pub async fn get_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
) -> ApiResult<Json<ToolInfo>> {
    let tool = tool_service::get_tool(&state, &tool_name)?;
    Ok(Json(tool))
}

/// POST /api/v1/mcp/tools/execute
/// A tool that fails still answers 200 with `success: false`
pub async fn execute_tool(
    State(state): State<AppState>,
    req: Result<Json<ExecuteTool>, JsonRejection>,
) -> ApiResult<Json<ToolExecution>> {
    let Json(req) = req?;

    let execution = tool_service::execute_tool(&state, req).await?;

    Ok(Json(execution))
}
