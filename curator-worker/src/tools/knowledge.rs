//! Document knowledge base search

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::{Tool, ToolError, error_body, optional_u64, required_str};

pub const DEFAULT_TOP_K: u64 = 3;
const MAX_TOP_K: u64 = 20;

/// Snippets handed to the model are cut to this many characters
const SNIPPET_CHARS: usize = 200;

/// `search_knowledge_base`, backed by the document search service at
/// `POST {url}/search`
pub struct KnowledgeBaseTool {
    client: Client,
    base_url: String,
}

impl KnowledgeBaseTool {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    text: String,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the document knowledge base for relevant information"
    }

    fn input_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to look for"},
                "top_k": {"type": "integer", "minimum": 1, "maximum": MAX_TOP_K, "default": DEFAULT_TOP_K}
            },
            "required": ["query"]
        })
    }

    async fn call(&self, parameters: JsonValue) -> Result<JsonValue, ToolError> {
        let query = required_str(&parameters, "query")?;
        let top_k = optional_u64(&parameters, "top_k")?
            .unwrap_or(DEFAULT_TOP_K)
            .min(MAX_TOP_K);

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ToolError::Status {
                server: "knowledge base".to_string(),
                status: response.status().as_u16(),
                body: error_body(response).await,
            });
        }

        let found: SearchResponse = response.json().await?;
        Ok(summarize(query, found))
    }
}

fn summarize(query: &str, found: SearchResponse) -> JsonValue {
    if found.results.is_empty() {
        return json!({
            "query": query,
            "results": [],
            "message": format!("No relevant information found for: {}", query)
        });
    }

    let results: Vec<JsonValue> = found
        .results
        .into_iter()
        .map(|hit| {
            let mut text: String = hit.text.chars().take(SNIPPET_CHARS).collect();
            if hit.text.chars().count() > SNIPPET_CHARS {
                text.push_str("...");
            }
            json!({"text": text, "score": hit.score})
        })
        .collect();

    json!({"query": query, "results": results})
}
