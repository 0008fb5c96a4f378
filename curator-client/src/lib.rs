//! Curator HTTP Client
//!
//! A small, typed client for the Curator API, used by the CLI.
//!
//! # Example
//!
//! ```no_run
//! use curator_client::CuratorClient;
//! use curator_core::dto::job::SubmitJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CuratorClient::new("http://localhost:8000");
//!
//!     let submission = client
//!         .submit_job(&SubmitJob::new("Write a 2-line product tagline").with_priority(5))
//!         .await?;
//!
//!     println!("Submitted job: {}", submission.job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod health;
mod jobs;
mod tools;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// HTTP client for the Curator API
#[derive(Debug, Clone)]
pub struct CuratorClient {
    /// Base URL of the API (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl CuratorClient {
    /// Create a new client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Error bodies of the form `{"error": "..."}` are unwrapped into the
    /// message.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_message(&error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CuratorClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = CuratorClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_error_message_unwraps_api_errors() {
        assert_eq!(error_message(r#"{"error":"Job x not found"}"#), "Job x not found");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
