//! Pipeline execution
//!
//! A job runs through strategy, creation and review, in that order. Each stage
//! is one agent holding a tool-use conversation with the model; only a
//! generation failure stops the pipeline.

pub mod agents;
mod executor;

pub use agents::{AGENTS, Agent};
pub use executor::PipelineExecutor;

use async_trait::async_trait;
use curator_core::domain::{JobId, JobInput, StageKind, WorkflowResult};

use crate::generation::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} stage failed")]
    Generation {
        stage: StageKind,
        #[source]
        source: GenerationError,
    },

    #[error("{stage} stage produced no output")]
    EmptyOutput { stage: StageKind },
}

impl PipelineError {
    pub fn stage(&self) -> StageKind {
        match self {
            PipelineError::Generation { stage, .. } | PipelineError::EmptyOutput { stage } => *stage,
        }
    }
}

/// Runs the whole pipeline for one job
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    async fn execute(&self, job_id: JobId, input: &JobInput) -> Result<WorkflowResult, PipelineError>;
}
