//! Workflow API Handlers
//!
//! HTTP endpoints for submitting creative workflow jobs and following them.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
};
use curator_core::domain::{Job, JobId};
use curator_core::dto::job::{JobList, JobSubmission, ListJobs, SubmitJob};

use crate::api::error::{ApiError, ApiResult};
use crate::service::job_service;
use crate::state::AppState;

/// POST /api/v1/workflow/submit
/// Validate, store and queue a new job
pub async fn submit_job(
    State(state): State<AppState>,
    req: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobSubmission>)> {
    let Json(req) = req?;
    tracing::info!("Submitting job: {}", preview(&req.task_description));

    let submission = job_service::submit_job(&state, req).await?;

    Ok((StatusCode::OK, Json(submission)))
}

/// GET /api/v1/workflow/status/{job_id}
/// Full job record
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", job_id);

    let id: JobId = job_id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    let job = job_service::get_job(&state, id).await?;

    Ok(Json(job))
}

/// GET /api/v1/workflow/jobs
/// Recent jobs, newest first
///
/// Query parameters:
/// - `limit` (optional): default 10, at most 100
/// - `status` (optional): only jobs in this status
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<ListJobs>, QueryRejection>,
) -> ApiResult<Json<JobList>> {
    let Query(query) = query?;

    let jobs = job_service::list_jobs(&state, query).await?;

    Ok(Json(jobs))
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        preview.push_str("...");
    }
    preview
}
