//! Curator Worker
//!
//! Standalone worker process. Runs `WORKER_CONCURRENCY` sequential worker
//! loops against the shared PostgreSQL store and queue until interrupted or
//! until a loop hits a store or queue fault. Jobs already running are
//! finished before the process exits.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_worker::config::WorkerConfig;
use curator_worker::scheduler::{drain_workers, spawn_workers};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator_worker=info,curator_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Curator Worker");

    // Load configuration
    let config = WorkerConfig::from_env()?;
    config.validate_standalone()?;
    info!(
        "Loaded configuration: worker_id={}, concurrency={}, model={}",
        config.worker_id, config.concurrency, config.pipeline.generation.model
    );

    let backends = curator_store::connect(&config.store).await?;
    let executor = curator_worker::build_executor(&config.pipeline)?;

    let shutdown = CancellationToken::new();
    let names = (1..=config.concurrency).map(|n| config.consumer_name(n));
    let mut workers = spawn_workers(names, &backends, executor, &shutdown);

    info!("Worker initialized successfully");

    let first_exit = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, finishing running jobs");
            None
        }
        Some(joined) = workers.join_next() => Some(joined),
    };

    shutdown.cancel();

    let exited: Result<()> = match first_exit {
        None => Ok(()),
        Some(Ok(Ok(()))) => {
            warn!("Worker loop exited");
            Ok(())
        }
        Some(Ok(Err(e))) => {
            error!("Worker loop failed: {}", e);
            Err(e.into())
        }
        Some(Err(e)) => {
            error!("Worker task panicked: {}", e);
            Err(e.into())
        }
    };

    let drained = drain_workers(&mut workers).await;
    info!("All worker loops stopped");

    exited.and(drained)
}
