//! Workflow job endpoints

use crate::CuratorClient;
use crate::error::{ClientError, Result};
use curator_core::domain::{Job, JobId};
use curator_core::dto::job::{JobList, JobSubmission, ListJobs, SubmitJob};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

impl CuratorClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a new creative workflow job
    pub async fn submit_job(&self, req: &SubmitJob) -> Result<JobSubmission> {
        let url = format!("{}/api/v1/workflow/submit", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: JobId) -> Result<Job> {
        let url = format!("{}/api/v1/workflow/status/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List recent jobs, newest first
    pub async fn list_jobs(&self, query: &ListJobs) -> Result<JobList> {
        let url = format!("{}/api/v1/workflow/jobs", self.base_url);
        let response = self.client.get(&url).query(query).send().await?;

        self.handle_response(response).await
    }

    /// Poll a job until it is `completed` or `failed`
    ///
    /// # Arguments
    /// * `job_id` - The job to wait for
    /// * `poll_interval` - Delay between status requests
    /// * `timeout` - Give up after this long; `None` waits forever
    pub async fn wait_for_job(
        &self,
        job_id: JobId,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<Job> {
        let started = Instant::now();

        loop {
            let job = self.get_job(job_id).await?;
            if job.status.is_terminal() {
                return Ok(job);
            }

            debug!("Job {} is {}, waiting", job_id, job.status);

            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    return Err(ClientError::Timeout {
                        job_id,
                        waited: started.elapsed(),
                    });
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
