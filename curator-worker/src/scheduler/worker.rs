//! Worker loop
//!
//! Dequeues a task, runs the pipeline for its job and writes the terminal
//! state. The task is acknowledged only after that write, so a worker dying
//! mid-job leaves the task to be redelivered once its visibility timeout
//! lapses.
//!
//! Shutdown is cooperative: a cancelled worker stops waiting for new tasks
//! but always finishes the job it is running.

use curator_core::domain::{JobUpdate, UpdateOutcome};
use curator_store::{Backends, Delivery, JobQueue, JobStore, QueueError, StoreError};
use std::error::Error;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::pipeline::WorkflowExecutor;

/// Failure messages stored on a job are cut to this many characters
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Infrastructure faults that stop a worker loop
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub struct Worker {
    name: String,
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    executor: Arc<dyn WorkflowExecutor>,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        executor: Arc<dyn WorkflowExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            queue,
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handles tasks one at a time until `shutdown` is cancelled or the
    /// store or queue fails. Cancellation is only observed between tasks.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        info!("Worker {} waiting for tasks", self.name);

        loop {
            let delivery = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                delivery = self.queue.dequeue(&self.name) => delivery?,
            };

            self.handle(&delivery).await?;
        }

        info!("Worker {} stopped", self.name);
        Ok(())
    }

    /// Processes a single delivery and acknowledges it.
    ///
    /// Only store and queue faults are returned; anything that goes wrong
    /// with the job itself ends up on the job record.
    #[instrument(
        skip(self, delivery),
        fields(worker = %self.name, job_id = %delivery.job_id, attempt = delivery.attempt)
    )]
    pub async fn handle(&self, delivery: &Delivery) -> Result<(), WorkerError> {
        let job = match self.store.get(delivery.job_id).await {
            Ok(job) => job,
            Err(StoreError::NotFound(_)) => {
                warn!("Job not found or expired, dropping task");
                self.queue.ack(delivery).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if job.status.is_terminal() {
            info!("Job already {}, dropping redelivered task", job.status);
            self.queue.ack(delivery).await?;
            return Ok(());
        }

        match self.store.update(job.job_id, JobUpdate::processing()).await {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                warn!("Job expired before processing started, dropping task");
                self.queue.ack(delivery).await?;
                return Ok(());
            }
            Err(StoreError::InvalidTransition(e)) => {
                info!("Job finished elsewhere ({}), dropping task", e);
                self.queue.ack(delivery).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!("Processing job");

        let update = match self.executor.execute(job.job_id, &job.input).await {
            Ok(result) => {
                info!(
                    "Job completed ({} stages, {} tool call(s), {} failed)",
                    result.task_count,
                    result.tool_invocation_count,
                    result.failed_tool_invocations().count()
                );
                JobUpdate::completed(result)
            }
            Err(e) => {
                error!("Job failed: {}", error_chain(&e));
                JobUpdate::failed(summarize_error(&e))
            }
        };

        match self.store.update(job.job_id, update).await {
            Ok(UpdateOutcome::Applied) => {}
            Ok(UpdateOutcome::Superseded) => {
                info!("A newer result is already recorded, keeping it");
            }
            Err(StoreError::NotFound(_)) => {
                warn!("Job expired before its result could be recorded");
            }
            Err(StoreError::InvalidTransition(e)) => {
                warn!("Could not record result: {}", e);
            }
            Err(e) => return Err(e.into()),
        }

        self.queue.ack(delivery).await?;
        Ok(())
    }
}

/// Starts one sequential worker loop per consumer name. Every loop stops
/// once `shutdown` is cancelled and its current job is done.
pub fn spawn_workers(
    names: impl IntoIterator<Item = String>,
    backends: &Backends,
    executor: Arc<dyn WorkflowExecutor>,
    shutdown: &CancellationToken,
) -> JoinSet<Result<(), WorkerError>> {
    let mut workers = JoinSet::new();

    for name in names {
        let worker = Worker::new(
            name,
            Arc::clone(&backends.store),
            Arc::clone(&backends.queue),
            Arc::clone(&executor),
        );

        let shutdown = shutdown.clone();
        workers.spawn(async move {
            let result = worker.run(shutdown).await;
            if let Err(e) = &result {
                error!("Worker {} stopped: {}", worker.name(), e);
            }
            result
        });
    }

    workers
}

/// Waits for every worker loop to return, logging the ones that failed.
/// Returns the first failure.
pub async fn drain_workers(workers: &mut JoinSet<Result<(), WorkerError>>) -> anyhow::Result<()> {
    let mut first_failure = None;

    while let Some(joined) = workers.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => anyhow::Error::new(e).context("Worker loop failed"),
            Err(e) => anyhow::Error::new(e).context("Worker task panicked"),
        };

        error!("{:#}", failure);
        first_failure.get_or_insert(failure);
    }

    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

/// Full cause chain, outermost first, joined with ": "
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    chain
}

/// Single-line, length-bounded form of [`error_chain`] fit for a job record
pub fn summarize_error(err: &(dyn Error + 'static)) -> String {
    let line = error_chain(err)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if line.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return line;
    }

    let mut summary: String = line.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    summary.push_str("...");
    summary
}
