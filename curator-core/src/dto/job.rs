//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::job::{Job, JobId, JobInput, JobStatus, MAX_PRIORITY, MIN_PRIORITY};

/// Listing descriptions are cut to this many characters
pub const SUMMARY_DESCRIPTION_LIMIT: usize = 100;

pub const DEFAULT_LIST_LIMIT: usize = 10;
pub const MAX_LIST_LIMIT: usize = 100;

/// Request to submit a new creative workflow job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJob {
    pub task_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<BTreeMap<String, serde_json::Value>>,
    /// Kept wide so out-of-range values are reported as validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task_description must not be empty")]
    EmptyTaskDescription,

    #[error("priority must be between 1 and 10 (got {0})")]
    PriorityOutOfRange(i64),

    #[error("tool_name must not be empty")]
    EmptyToolName,

    #[error("parameters must be a JSON object")]
    ParametersNotObject,
}

impl SubmitJob {
    pub fn new(task_description: impl Into<String>) -> Self {
        Self {
            task_description: task_description.into(),
            project_context: None,
            requirements: None,
            priority: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.project_context = Some(context.into());
        self
    }

    pub fn with_requirement(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.requirements
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Validates the request and converts it into a stored job input
    pub fn into_input(self) -> Result<JobInput, ValidationError> {
        let task_description = self.task_description.trim().to_string();
        if task_description.is_empty() {
            return Err(ValidationError::EmptyTaskDescription);
        }

        let priority = match self.priority {
            None => crate::domain::job::DEFAULT_PRIORITY,
            Some(p) if (MIN_PRIORITY as i64..=MAX_PRIORITY as i64).contains(&p) => p as u8,
            Some(p) => return Err(ValidationError::PriorityOutOfRange(p)),
        };

        let project_context = self
            .project_context
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let requirements = self.requirements.filter(|r| !r.is_empty());

        Ok(JobInput {
            task_description,
            project_context,
            requirements,
            priority,
        })
    }
}

/// Response to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}

impl JobSubmission {
    pub fn accepted(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            message: format!("Creative workflow job {} submitted successfully", job_id),
        }
    }
}

/// Lightweight job summary for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub task_description: String,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            task_description: truncate_description(&job.input.task_description),
            priority: job.input.priority,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() > SUMMARY_DESCRIPTION_LIMIT {
        let mut truncated: String = description.chars().take(SUMMARY_DESCRIPTION_LIMIT).collect();
        truncated.push_str("...");
        truncated
    } else {
        description.to_string()
    }
}

/// Query parameters for listing jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl ListJobs {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
    }
}

/// Response to a listing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<JobSummary>,
    pub total: usize,
    pub limit: usize,
}
