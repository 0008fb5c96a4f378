//! Media generation through external tool servers
//!
//! Each server exposes `POST {url}/tools/execute` taking
//! `{"tool_name": ..., "parameters": {...}}`. A tool tries its servers in
//! order (the general media server first) and returns the first success.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use tracing::{info, warn};

use super::{Tool, ToolError, error_body, optional_str, optional_u64, required_str};

pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";
pub const DEFAULT_VIDEO_SECONDS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Speech,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Image, MediaKind::Speech, MediaKind::Video];

    pub fn tool_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "generate_image",
            MediaKind::Speech => "generate_tts",
            MediaKind::Video => "generate_video",
        }
    }

    /// Name of the dedicated server for this kind
    pub fn server_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "image_generation",
            MediaKind::Speech => "tts_generation",
            MediaKind::Video => "video_generation",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            MediaKind::Image => "Generate an image from a text prompt",
            MediaKind::Speech => "Generate speech audio from text",
            MediaKind::Video => "Generate a short video from a text prompt",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Speech => "TTS",
            MediaKind::Video => "video",
        }
    }

    fn input_schema(&self) -> JsonValue {
        match self {
            MediaKind::Image => json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string"},
                    "style": {"type": "string"},
                    "size": {"type": "string", "default": DEFAULT_IMAGE_SIZE}
                },
                "required": ["prompt"]
            }),
            MediaKind::Speech => json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "voice": {"type": "string"},
                    "format": {"type": "string", "default": DEFAULT_AUDIO_FORMAT}
                },
                "required": ["text"]
            }),
            MediaKind::Video => json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string"},
                    "duration": {"type": "integer", "minimum": 1, "default": DEFAULT_VIDEO_SECONDS},
                    "style": {"type": "string"}
                },
                "required": ["prompt"]
            }),
        }
    }

    /// Validates the model's arguments and fills in defaults
    fn server_parameters(&self, input: &JsonValue) -> Result<JsonValue, ToolError> {
        let mut params = Map::new();

        match self {
            MediaKind::Image => {
                params.insert("prompt".into(), required_str(input, "prompt")?.into());
                let size = optional_str(input, "size")?.unwrap_or(DEFAULT_IMAGE_SIZE);
                params.insert("size".into(), size.into());
                if let Some(style) = optional_str(input, "style")? {
                    params.insert("style".into(), style.into());
                }
            }
            MediaKind::Speech => {
                params.insert("text".into(), required_str(input, "text")?.into());
                let format = optional_str(input, "format")?.unwrap_or(DEFAULT_AUDIO_FORMAT);
                params.insert("format".into(), format.into());
                if let Some(voice) = optional_str(input, "voice")? {
                    params.insert("voice".into(), voice.into());
                }
            }
            MediaKind::Video => {
                params.insert("prompt".into(), required_str(input, "prompt")?.into());
                let duration = optional_u64(input, "duration")?.unwrap_or(DEFAULT_VIDEO_SECONDS);
                params.insert("duration".into(), duration.into());
                if let Some(style) = optional_str(input, "style")? {
                    params.insert("style".into(), style.into());
                }
            }
        }

        Ok(JsonValue::Object(params))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaServer {
    pub name: String,
    pub url: String,
}

impl MediaServer {
    pub fn new(name: impl Into<String>, url: &str) -> Self {
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    tool_name: &'a str,
    parameters: &'a JsonValue,
}

pub struct MediaTool {
    kind: MediaKind,
    servers: Vec<MediaServer>,
    client: Client,
}

impl MediaTool {
    pub fn new(kind: MediaKind, servers: Vec<MediaServer>, client: Client) -> Self {
        Self {
            kind,
            servers,
            client,
        }
    }

    async fn execute_on(&self, server: &MediaServer, parameters: &JsonValue) -> Result<JsonValue, ToolError> {
        info!("Calling external tool {}/{}", server.name, self.kind.tool_name());

        let response = self
            .client
            .post(format!("{}/tools/execute", server.url))
            .json(&ExecuteRequest {
                tool_name: self.kind.tool_name(),
                parameters,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ToolError::Status {
                server: server.name.clone(),
                status: response.status().as_u16(),
                body: error_body(response).await,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Tool for MediaTool {
    fn name(&self) -> &str {
        self.kind.tool_name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn input_schema(&self) -> JsonValue {
        self.kind.input_schema()
    }

    async fn call(&self, parameters: JsonValue) -> Result<JsonValue, ToolError> {
        let parameters = self.kind.server_parameters(&parameters)?;
        let mut last_error = None;

        for server in &self.servers {
            match self.execute_on(server, &parameters).await {
                Ok(result) => return Ok(json!({"server": server.name, "result": result})),
                Err(e) => {
                    warn!("{} failed on {}: {}", self.kind.tool_name(), server.name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => ToolError::Unavailable(format!(
                "No {} generation server succeeded: {}",
                self.kind.label(),
                e
            )),
            None => ToolError::Unavailable(format!(
                "No {} generation server available",
                self.kind.label()
            )),
        })
    }
}
