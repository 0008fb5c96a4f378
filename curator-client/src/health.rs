//! Health endpoint

use crate::CuratorClient;
use crate::error::Result;
use curator_core::dto::health::HealthReport;

impl CuratorClient {
    /// Store and queue status as seen by the API
    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
