//! Job store
//!
//! Key-value persistence for job records, shared by the API (creates
//! records) and workers (drive them to a terminal state). Every backend
//! funnels status changes through [`curator_core::domain::Job::apply`].

mod memory;
mod postgres;

pub use memory::InMemoryJobStore;
pub use postgres::PgJobStore;

use async_trait::async_trait;
use curator_core::domain::{Job, JobId, JobStatus, JobUpdate, UpdateOutcome};

use crate::error::StoreError;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Stores a new record
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the id was ever used.
    async fn create(&self, job: &Job) -> Result<(), StoreError>;

    /// Fetches a record; expired records are [`StoreError::NotFound`]
    async fn get(&self, job_id: JobId) -> Result<Job, StoreError>;

    /// Applies a status update atomically with respect to other updates of
    /// the same job
    async fn update(&self, job_id: JobId, update: JobUpdate) -> Result<UpdateOutcome, StoreError>;

    /// Up to `limit` live records, newest first, optionally filtered by status
    async fn list(&self, limit: usize, status: Option<JobStatus>) -> Result<Vec<Job>, StoreError>;

    /// Health probe
    async fn ping(&self) -> Result<(), StoreError>;

    /// Physically removes expired records, returning how many went
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

fn expiry(
    updated_at: chrono::DateTime<chrono::Utc>,
    ttl: std::time::Duration,
) -> chrono::DateTime<chrono::Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    updated_at
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}
