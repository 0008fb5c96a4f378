//! Curator Store
//!
//! Persistence for the job pipeline: the [`JobStore`] holding job records and
//! the [`JobQueue`] carrying "execute job N" tasks from the API to workers.
//!
//! Both come in two flavours:
//! - `memory`: process-local, for tests and single-process deployments
//! - `postgres`: shared between the API and any number of worker processes

pub mod config;
pub mod db;
pub mod error;
pub mod queue;
pub mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub use config::{StoreBackend, StoreConfig};
pub use error::{QueueError, StoreError};
pub use queue::{Delivery, InMemoryJobQueue, JobQueue, PgJobQueue, QueueTask};
pub use store::{InMemoryJobStore, JobStore, PgJobStore};

/// The store and queue a process talks to
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<dyn JobQueue>,
}

impl Backends {
    /// Fresh in-memory store and queue
    pub fn in_memory(config: &StoreConfig) -> Self {
        Self {
            store: Arc::new(InMemoryJobStore::new(config.job_ttl)),
            queue: Arc::new(InMemoryJobQueue::new(
                config.visibility_timeout,
                config.poll_interval,
                config.priority_ordering,
            )),
        }
    }
}

/// Builds the configured backends, running migrations for PostgreSQL
pub async fn connect(config: &StoreConfig) -> Result<Backends> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory job store and queue");
            Ok(Backends::in_memory(config))
        }
        StoreBackend::Postgres => {
            info!("Connecting to database...");

            let pool = db::create_pool(&config.database_url, config.max_connections)
                .await
                .context("Failed to create database pool")?;

            info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok(Backends {
                store: Arc::new(PgJobStore::new(pool.clone(), config.job_ttl)),
                queue: Arc::new(PgJobQueue::new(
                    pool,
                    config.visibility_timeout,
                    config.poll_interval,
                    config.priority_ordering,
                )),
            })
        }
    }
}
