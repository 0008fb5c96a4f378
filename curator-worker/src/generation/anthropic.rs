//! Anthropic Messages API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationBackend, GenerationError, GenerationRequest, GenerationResponse, Message, ToolSpec};
use crate::config::GenerationConfig;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP client for `POST {base_url}/v1/messages`
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    /// Builds a client whose requests time out after `config.timeout`
    pub fn new(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> MessagesRequest<'a> {
        let tool_choice = match (request.tools.is_empty(), request.allow_tool_use) {
            (true, _) => None,
            (false, true) => Some(ToolChoice::Auto),
            (false, false) => Some(ToolChoice::None),
        };

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: &request.system,
            messages: &request.messages,
            tools: &request.tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl GenerationBackend for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let url = format!("{}/v1/messages", self.base_url);

        debug!(
            "Calling {} with {} message(s) and {} tool(s)",
            self.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str::<GenerationResponse>(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolSpec],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ToolChoice {
    Auto,
    None,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// The API's error message when the body has the usual shape, else the
/// body itself (shortened)
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ContentBlock;
    use serde_json::json;
    use std::time::Duration;

    fn client() -> AnthropicClient {
        AnthropicClient::new(&GenerationConfig {
            api_key: "test-key".to_string(),
            base_url: "https://api.anthropic.com/".to_string(),
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
            max_retries: 0,
        })
        .unwrap()
    }

    fn search_spec() -> ToolSpec {
        ToolSpec {
            name: "search_knowledge_base".to_string(),
            description: "Search".to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_base_url_is_trimmed() {
        assert_eq!(client().base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_body_without_tools() {
        let client = client();
        let request = GenerationRequest {
            system: "You are a Creative Director".to_string(),
            messages: vec![Message::user("Write a tagline")],
            tools: Vec::new(),
            allow_tool_use: true,
        };

        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["system"], "You are a Creative Director");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_body_tool_choice() {
        let client = client();
        let mut request = GenerationRequest {
            system: String::new(),
            messages: vec![Message::user("x")],
            tools: vec![search_spec()],
            allow_tool_use: true,
        };

        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert_eq!(body["tools"][0]["name"], "search_knowledge_base");
        assert_eq!(body["tool_choice"], json!({"type": "auto"}));

        request.allow_tool_use = false;
        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert_eq!(body["tool_choice"], json!({"type": "none"}));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(error_message(body), "Overloaded");
        assert_eq!(error_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Fresh ideas, delivered."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: GenerationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.content, vec![ContentBlock::text("Fresh ideas, delivered.")]);
    }
}
