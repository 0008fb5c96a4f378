//! Store and queue errors

use curator_core::domain::{JobId, TransitionError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unknown or expired job
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {0} already exists")]
    DuplicateKey(JobId),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("stored record for job {job_id} is malformed: {reason}")]
    Corrupt { job_id: JobId, reason: String },

    #[error("failed to encode job: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("job store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl StoreError {
    /// Infrastructure faults, as opposed to answers about a particular job
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}
