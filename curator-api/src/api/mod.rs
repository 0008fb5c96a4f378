//! API Module
//!
//! HTTP API layer for Curator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod tool;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Banner and health check
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // Workflow endpoints
        .route("/api/v1/workflow/submit", post(job::submit_job))
        .route("/api/v1/workflow/status/{job_id}", get(job::get_job_status))
        .route("/api/v1/workflow/jobs", get(job::list_jobs))
        // Tool endpoints
        .route("/api/v1/mcp/tools", get(tool::list_tools))
        .route("/api/v1/mcp/tools/execute", post(tool::execute_tool))
        .route("/api/v1/mcp/tools/{tool_name}", get(tool::get_tool))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
