//! Health Check API Handlers

use axum::{Json, extract::State};
use curator_core::dto::health::HealthReport;
use serde_json::{Value as JsonValue, json};

use crate::service::health_service;
use crate::state::AppState;

/// GET /
/// Service banner
pub async fn root() -> Json<JsonValue> {
    Json(json!({
        "message": "Curator API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health"
    }))
}

/// GET /health
/// Store and queue probe; always answers 200 and reports degradation in
/// the body
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    let report = health_service::check(&state).await;
    tracing::debug!("Health check: {}", report.status);
    Json(report)
}
