//! Health DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Without the store nothing works; without the queue reads still do.
    pub fn from_probes(store_connected: bool, queue_connected: bool) -> Self {
        match (store_connected, queue_connected) {
            (true, true) => HealthStatus::Healthy,
            (true, false) => HealthStatus::Degraded,
            (false, _) => HealthStatus::Unhealthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store_connected: bool,
    pub queue_connected: bool,
    pub queue_depth: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(store_connected: bool, queue_depth: Option<u64>) -> Self {
        let queue_connected = queue_depth.is_some();
        Self {
            status: HealthStatus::from_probes(store_connected, queue_connected),
            store_connected,
            queue_connected,
            queue_depth,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_probes() {
        assert_eq!(HealthStatus::from_probes(true, true), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_probes(true, false), HealthStatus::Degraded);
        assert_eq!(HealthStatus::from_probes(false, true), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::from_probes(false, false), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_report_derives_queue_connectivity_from_depth() {
        let report = HealthReport::new(true, Some(3));
        assert!(report.queue_connected);
        assert_eq!(report.status, HealthStatus::Healthy);

        let report = HealthReport::new(true, None);
        assert!(!report.queue_connected);
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(HealthReport::new(false, None)).unwrap();
        assert_eq!(value["status"], "unhealthy");
    }
}
