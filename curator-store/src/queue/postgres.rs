//! PostgreSQL job queue
//!
//! Tasks are rows in `job_queue`. Consumers claim a row with
//! `FOR UPDATE SKIP LOCKED` and lease it until `locked_until`; an expired
//! lease makes the row claimable again. Acknowledging deletes the row.

use async_trait::async_trait;
use curator_core::domain::JobId;
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{Delivery, JobQueue, QueueTask};
use crate::error::QueueError;

const CLAIM_FIFO: &str = r#"
    UPDATE job_queue
    SET delivery_count = delivery_count + 1,
        locked_by = $1,
        locked_until = NOW() + make_interval(secs => $2)
    WHERE id = (
        SELECT id FROM job_queue
        WHERE locked_until IS NULL OR locked_until <= NOW()
        ORDER BY id
        FOR UPDATE SKIP LOCKED
        LIMIT 1
    )
    RETURNING id, job_id, priority, delivery_count
"#;

const CLAIM_BY_PRIORITY: &str = r#"
    UPDATE job_queue
    SET delivery_count = delivery_count + 1,
        locked_by = $1,
        locked_until = NOW() + make_interval(secs => $2)
    WHERE id = (
        SELECT id FROM job_queue
        WHERE locked_until IS NULL OR locked_until <= NOW()
        ORDER BY priority DESC, id
        FOR UPDATE SKIP LOCKED
        LIMIT 1
    )
    RETURNING id, job_id, priority, delivery_count
"#;

pub struct PgJobQueue {
    pool: PgPool,
    visibility_timeout: Duration,
    poll_interval: Duration,
    priority_ordering: bool,
}

impl PgJobQueue {
    pub fn new(
        pool: PgPool,
        visibility_timeout: Duration,
        poll_interval: Duration,
        priority_ordering: bool,
    ) -> Self {
        Self {
            pool,
            visibility_timeout,
            poll_interval,
            priority_ordering,
        }
    }

    async fn try_claim(&self, consumer: &str) -> Result<Option<Delivery>, QueueError> {
        let query = if self.priority_ordering {
            CLAIM_BY_PRIORITY
        } else {
            CLAIM_FIFO
        };

        let row = sqlx::query_as::<_, DeliveryRow>(query)
            .bind(consumer)
            .bind(self.visibility_timeout.as_secs_f64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Delivery::from))
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, task: QueueTask) -> Result<(), QueueError> {
        sqlx::query("INSERT INTO job_queue (job_id, priority) VALUES ($1, $2)")
            .bind(task.job_id.as_uuid())
            .bind(i16::from(task.priority))
            .execute(&self.pool)
            .await?;

        debug!("Enqueued job {}", task.job_id);
        Ok(())
    }

    async fn dequeue(&self, consumer: &str) -> Result<Delivery, QueueError> {
        loop {
            if let Some(delivery) = self.try_claim(consumer).await? {
                debug!(
                    "Delivered job {} to {} (attempt {})",
                    delivery.job_id, consumer, delivery.attempt
                );
                return Ok(delivery);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM job_queue WHERE id = $1")
            .bind(delivery.delivery_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn depth(&self) -> Result<u64, QueueError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: i64,
    job_id: Uuid,
    priority: i16,
    delivery_count: i32,
}

impl From<DeliveryRow> for Delivery {
    fn from(row: DeliveryRow) -> Self {
        Delivery {
            delivery_id: row.id,
            job_id: JobId::from(row.job_id),
            priority: u8::try_from(row.priority).unwrap_or_default(),
            attempt: u32::try_from(row.delivery_count).unwrap_or_default(),
        }
    }
}
