//! Job Service
//!
//! Business logic for submitting and inspecting jobs.

use curator_core::domain::{Job, JobId};
use curator_core::dto::job::{JobList, JobSubmission, JobSummary, ListJobs, SubmitJob, ValidationError};
use curator_store::{QueueError, QueueTask, StoreError};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => JobError::NotFound(id),
            other => JobError::Store(other),
        }
    }
}

/// Validates the request, stores a `pending` record and queues it.
///
/// The record is written before the task is queued, so a worker never sees a
/// task for a job it cannot load. If queueing fails the record stays
/// `pending` until it expires.
pub async fn submit_job(state: &AppState, req: SubmitJob) -> Result<JobSubmission, JobError> {
    let input = req.into_input()?;
    let job = Job::new(input);
    let job_id = job.job_id;

    state.store.create(&job).await?;

    let task = QueueTask {
        job_id,
        priority: job.input.priority,
    };
    if let Err(e) = state.queue.enqueue(task).await {
        error!("Failed to queue job {}: {}", job_id, e);
        return Err(e.into());
    }

    info!("Job submitted: {} (priority {})", job_id, task.priority);

    Ok(JobSubmission::accepted(job_id))
}

/// Get a job by ID
pub async fn get_job(state: &AppState, job_id: JobId) -> Result<Job, JobError> {
    let job = state.store.get(job_id).await?;
    Ok(job)
}

/// Newest jobs first, optionally filtered by status
pub async fn list_jobs(state: &AppState, query: ListJobs) -> Result<JobList, JobError> {
    let limit = query.effective_limit();
    debug!("Listing up to {} jobs (status: {:?})", limit, query.status);

    let jobs = state.store.list(limit, query.status).await?;
    let jobs: Vec<JobSummary> = jobs.iter().map(JobSummary::from).collect();

    Ok(JobList {
        total: jobs.len(),
        jobs,
        limit,
    })
}
