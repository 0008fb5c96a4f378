//! Curator Worker
//!
//! Executes creative workflow jobs taken off the job queue.
//!
//! Architecture:
//! - Configuration: worker, store and pipeline settings from the environment
//! - Generation: the model client, with retries for transient faults
//! - Tools: knowledge base search and media generation servers
//! - Pipeline: the strategy, creation and review stages
//! - Scheduler: worker loops driving jobs to a terminal state
//!
//! The library is shared by the standalone worker binary and the API's
//! embedded-workers mode.

pub mod config;
pub mod generation;
pub mod pipeline;
pub mod scheduler;
pub mod tools;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::generation::{AnthropicClient, RetryPolicy, Retrying};
use crate::pipeline::{PipelineExecutor, WorkflowExecutor};
use crate::tools::ToolRegistry;

/// Builds the production pipeline: Anthropic generation with retries plus
/// every configured tool
pub fn build_executor(config: &PipelineConfig) -> Result<Arc<dyn WorkflowExecutor>> {
    let client =
        AnthropicClient::new(&config.generation).context("Failed to create generation client")?;
    let backend = Retrying::new(client, RetryPolicy::new(config.generation.max_retries));

    let tools = ToolRegistry::from_config(&config.tools).context("Failed to create tool client")?;

    Ok(Arc::new(PipelineExecutor::new(
        Arc::new(backend),
        Arc::new(tools),
        config.max_tool_rounds,
    )))
}
