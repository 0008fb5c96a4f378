//! PostgreSQL job store
//!
//! One row per job in the `jobs` table. Updates lock the row with
//! `SELECT ... FOR UPDATE`, run the domain state machine and write back in
//! the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_core::domain::{Job, JobId, JobInput, JobStatus, JobUpdate, UpdateOutcome, WorkflowResult};
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{JobStore, expiry};
use crate::error::StoreError;

pub struct PgJobStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgJobStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: &Job) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (job_id, status, input, result, error_message,
                              created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job.job_id.as_uuid())
        .bind(job.status.as_str())
        .bind(serde_json::to_value(&job.input)?)
        .bind(job.result.as_ref().map(serde_json::to_value).transpose()?)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(expiry(job.updated_at, self.ttl))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey(job.job_id));
        }

        debug!("Stored job {}", job.job_id);
        Ok(())
    }

    async fn get(&self, job_id: JobId) -> Result<Job, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, status, input, result, error_message, created_at, updated_at
            FROM jobs
            WHERE job_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound(job_id))?.try_into()
    }

    async fn update(&self, job_id: JobId, update: JobUpdate) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, status, input, result, error_message, created_at, updated_at
            FROM jobs
            WHERE job_id = $1 AND expires_at > NOW()
            FOR UPDATE
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let mut job: Job = row.ok_or(StoreError::NotFound(job_id))?.try_into()?;
        let outcome = job.apply(update)?;

        if outcome == UpdateOutcome::Applied {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = $1, result = $2, error_message = $3,
                    updated_at = $4, expires_at = $5
                WHERE job_id = $6
                "#,
            )
            .bind(job.status.as_str())
            .bind(job.result.as_ref().map(serde_json::to_value).transpose()?)
            .bind(&job.error_message)
            .bind(job.updated_at)
            .bind(expiry(job.updated_at, self.ttl))
            .bind(job_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn list(&self, limit: usize, status: Option<JobStatus>) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, status, input, result, error_message, created_at, updated_at
            FROM jobs
            WHERE expires_at > NOW() AND ($1::VARCHAR IS NULL OR status = $1)
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: Uuid,
    status: String,
    input: serde_json::Value,
    result: Option<serde_json::Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_id = JobId::from(row.job_id);
        let corrupt = |reason: String| StoreError::Corrupt { job_id, reason };

        let status: JobStatus = row.status.parse().map_err(|e| corrupt(format!("{}", e)))?;
        let input: JobInput = serde_json::from_value(row.input)
            .map_err(|e| corrupt(format!("bad input: {}", e)))?;
        let result: Option<WorkflowResult> = row
            .result
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt(format!("bad result: {}", e)))?;

        let job = Job {
            job_id,
            status,
            input,
            result,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        if !job.is_consistent() {
            return Err(corrupt(format!(
                "{} job with result={} error_message={}",
                job.status,
                job.result.is_some(),
                job.error_message.is_some()
            )));
        }

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(status: &str, error_message: Option<&str>) -> JobRow {
        let now = Utc::now();
        JobRow {
            job_id: Uuid::new_v4(),
            status: status.to_string(),
            input: serde_json::to_value(JobInput::new("Write a 2-line product tagline")).unwrap(),
            result: None,
            error_message: error_message.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_decodes_into_job() {
        let job = Job::try_from(row("failed", Some("strategy stage failed"))).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.input.task_description, "Write a 2-line product tagline");
    }

    #[test]
    fn test_inconsistent_row_is_corrupt() {
        for bad in [row("completed", None), row("pending", Some("boom")), row("failed", None)] {
            assert!(matches!(Job::try_from(bad), Err(StoreError::Corrupt { .. })));
        }
    }

    #[test]
    fn test_unreadable_row_is_corrupt() {
        assert!(matches!(Job::try_from(row("sleeping", None)), Err(StoreError::Corrupt { .. })));

        let mut bad_input = row("pending", None);
        bad_input.input = json!({"priority": "high"});
        assert!(matches!(Job::try_from(bad_input), Err(StoreError::Corrupt { .. })));
    }
}
