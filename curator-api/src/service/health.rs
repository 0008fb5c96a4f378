//! Health Service
//!
//! Probes the job store and the queue.

use curator_core::dto::health::HealthReport;
use tracing::warn;

use crate::state::AppState;

pub async fn check(state: &AppState) -> HealthReport {
    let store_connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Job store health probe failed: {}", e);
            false
        }
    };

    let queue_depth = match state.queue.depth().await {
        Ok(depth) => Some(depth),
        Err(e) => {
            warn!("Queue health probe failed: {}", e);
            None
        }
    };

    HealthReport::new(store_connected, queue_depth)
}
