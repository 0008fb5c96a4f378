use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_api::{ApiConfig, AppState, create_router};
use curator_store::{Backends, JobStore, StoreBackend};
use curator_worker::config::PipelineConfig;
use curator_worker::scheduler::{WorkerError, drain_workers, spawn_workers};
use curator_worker::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Curator API...");

    let config = ApiConfig::from_env()?;
    config.validate()?;

    let backends = curator_store::connect(&config.store).await?;

    if config.store.backend == StoreBackend::Memory && config.embedded_workers == 0 {
        warn!("In-memory backend without embedded workers: submitted jobs will never run");
    }

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let mut workers = start_embedded_workers(&config, &backends, &shutdown)?;
    spawn_purge_task(Arc::clone(&backends.store), config.purge_interval, shutdown.clone());

    let tools = ToolRegistry::from_config(&config.tools).context("Failed to create tool client")?;

    // Build router with all API endpoints
    let app = create_router(AppState::new(backends, Arc::new(tools)));

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
    });

    // Embedded workers finish their current job before the process exits
    tokio::select! {
        served = &mut server => {
            shutdown.cancel();
            drain_workers(&mut workers).await?;
            served.context("Server task panicked")?.context("Failed to run server")?;
            info!("Server stopped");
            Ok(())
        }
        Some(joined) = workers.join_next() => {
            let exited: Result<()> = match joined {
                Ok(Ok(())) if shutdown.is_cancelled() => Ok(()),
                Ok(Ok(())) => Err(anyhow::anyhow!("Embedded worker exited")),
                Ok(Err(e)) => Err(e).context("Embedded worker failed"),
                Err(e) => Err(e).context("Embedded worker panicked"),
            };
            shutdown.cancel();
            drain_workers(&mut workers).await?;
            server.await.context("Server task panicked")?.context("Failed to run server")?;
            info!("Server stopped");
            exited
        }
    }
}

fn start_embedded_workers(
    config: &ApiConfig,
    backends: &Backends,
    shutdown: &CancellationToken,
) -> Result<JoinSet<Result<(), WorkerError>>> {
    if config.embedded_workers == 0 {
        return Ok(JoinSet::new());
    }

    let pipeline = PipelineConfig::from_env()?;
    pipeline.validate()?;
    let executor = curator_worker::build_executor(&pipeline)?;

    info!("Starting {} embedded worker(s)", config.embedded_workers);
    Ok(spawn_workers(config.worker_names(), backends, executor, shutdown))
}

/// Removes expired jobs every `interval` until shutdown
fn spawn_purge_task(store: Arc<dyn JobStore>, interval: Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.purge_expired().await {
                Ok(0) => debug!("No expired jobs to purge"),
                Ok(purged) => info!("Purged {} expired job(s)", purged),
                Err(e) => error!("Failed to purge expired jobs: {}", e),
            }
        }
    });
}

/// Cancels `shutdown` on Ctrl-C
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });
}
