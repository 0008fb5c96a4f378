//! Core domain types
//!
//! The job record is created by the API and driven to a terminal state by a
//! worker. The workflow types describe what a finished pipeline run produced.

pub mod job;
pub mod workflow;

pub use job::{
    Job, JobId, JobInput, JobStatus, JobUpdate, TransitionError, UpdateOutcome,
};
pub use workflow::{StageKind, StageOutput, ToolInvocation, ToolOutcome, WorkflowResult};
