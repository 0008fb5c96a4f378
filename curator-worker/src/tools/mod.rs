//! Tools
//!
//! Remote capabilities a pipeline stage may call while generating:
//! document search and media generation. Tools are registered by name in a
//! [`ToolRegistry`]; a failed call is reported to the model and recorded in
//! the stage output, it never fails the job.

mod knowledge;
mod media;
mod registry;

pub use knowledge::KnowledgeBaseTool;
pub use media::{MediaKind, MediaServer, MediaTool};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::generation::ToolSpec;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{server} returned {status}: {body}")]
    Status {
        server: String,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the parameters object
    fn input_schema(&self) -> JsonValue;

    async fn call(&self, parameters: JsonValue) -> Result<JsonValue, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Required string parameter
fn required_str<'a>(parameters: &'a JsonValue, key: &str) -> Result<&'a str, ToolError> {
    parameters
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be a non-empty string", key)))
}

/// Optional string parameter; null and blank count as absent
fn optional_str<'a>(parameters: &'a JsonValue, key: &str) -> Result<Option<&'a str>, ToolError> {
    match parameters.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) if value.trim().is_empty() => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.trim())),
        Some(_) => Err(ToolError::InvalidParameters(format!("'{}' must be a string", key))),
    }
}

/// Optional positive integer parameter
fn optional_u64(parameters: &JsonValue, key: &str) -> Result<Option<u64>, ToolError> {
    match parameters.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be a positive integer", key))),
    }
}

async fn error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(200).collect()
}
