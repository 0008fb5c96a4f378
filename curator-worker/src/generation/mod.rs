//! Text generation
//!
//! Every pipeline stage talks to the model through [`GenerationBackend`].
//! The production backend is the Anthropic Messages API, wrapped in
//! [`Retrying`] so transient faults are retried before a job is failed.

mod anthropic;
mod error;
mod retry;
pub mod types;

pub use anthropic::AnthropicClient;
pub use error::GenerationError;
pub use retry::{RetryPolicy, Retrying};
pub use types::{
    ContentBlock, GenerationRequest, GenerationResponse, Message, Role, ToolCall, ToolSpec,
};

use async_trait::async_trait;

/// A model that turns a conversation into the next assistant turn
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError>;
}
