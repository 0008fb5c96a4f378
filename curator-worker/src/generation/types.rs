//! Conversation types
//!
//! These serialize to the Anthropic Messages wire format, so the same values
//! are used for requests, responses and the tool-use loop in between.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use curator_core::domain::ToolOutcome;
use curator_core::dto::tool::ToolInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: JsonValue,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    /// Block types this client does not act on
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Feeds a tool outcome back to the model
    pub fn tool_result(tool_use_id: impl Into<String>, outcome: &ToolOutcome) -> Self {
        let content = if outcome.success {
            match &outcome.result {
                Some(JsonValue::String(text)) => text.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        } else {
            format!(
                "Error: {}",
                outcome.error.as_deref().unwrap_or("tool call failed")
            )
        };

        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: !outcome.success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

impl From<ToolSpec> for ToolInfo {
    fn from(spec: ToolSpec) -> Self {
        Self {
            name: spec.name,
            description: spec.description,
            input_schema: spec.input_schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    /// When false the model must answer in text even if tools are listed
    pub allow_tool_use: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: JsonValue,
}

impl GenerationResponse {
    /// All text blocks, joined
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// The assistant turn to echo back in the next request
    pub fn into_message(self) -> Message {
        Message::assistant(
            self.content
                .into_iter()
                .filter(|block| !matches!(block, ContentBlock::Unsupported))
                .collect(),
        )
    }
}
