//! Job queue
//!
//! Carries "execute job N" tasks from the API to workers. Delivery is
//! at-least-once: a task that is not acknowledged within the visibility
//! timeout is handed out again, so consumers must tolerate seeing a job twice.

mod memory;
mod postgres;

pub use memory::InMemoryJobQueue;
pub use postgres::PgJobQueue;

use async_trait::async_trait;
use curator_core::domain::JobId;

use crate::error::QueueError;

/// A task as submitted by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTask {
    pub job_id: JobId,
    pub priority: u8,
}

/// A task handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifies the queued message, stable across redeliveries
    pub delivery_id: i64,
    pub job_id: JobId,
    pub priority: u8,
    /// 1 on first delivery
    pub attempt: u32,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, task: QueueTask) -> Result<(), QueueError>;

    /// Waits until a task is available and claims it for `consumer`
    async fn dequeue(&self, consumer: &str) -> Result<Delivery, QueueError>;

    /// Removes a delivered task for good. Acknowledging twice is harmless.
    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Ready plus in-flight tasks
    async fn depth(&self) -> Result<u64, QueueError>;

    async fn ping(&self) -> Result<(), QueueError>;
}
