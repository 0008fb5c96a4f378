use curator_store::{Backends, JobQueue, JobStore};
use curator_worker::tools::ToolRegistry;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<dyn JobQueue>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(backends: Backends, tools: Arc<ToolRegistry>) -> Self {
        Self {
            store: backends.store,
            queue: backends.queue,
            tools,
        }
    }
}
