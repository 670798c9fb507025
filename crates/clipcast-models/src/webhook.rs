//! Webhook configuration and payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::job::{JobId, JobStatus};

/// Delivery target for job-outcome notifications.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookConfig {
    /// Endpoint to POST the payload to
    #[validate(url)]
    pub url: String,

    /// Event names the subscriber wants; delivery is skipped for
    /// anything not in this set
    #[serde(default = "default_events")]
    pub events: Vec<String>,

    /// Extra headers merged into the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

fn default_events() -> Vec<String> {
    vec!["completed".to_string(), "failed".to_string()]
}

impl WebhookConfig {
    /// Whether the subscriber wants this event.
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

/// Outgoing job-outcome notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event name ("completed", "failed", "test")
    pub event: String,
    /// Job this notification is about
    pub job_id: JobId,
    /// Job status at delivery time
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Delivery timestamp
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    /// Payload for a successfully completed job.
    pub fn completed(job_id: JobId, video_id: String, video_url: String) -> Self {
        Self {
            event: "completed".to_string(),
            job_id,
            status: JobStatus::Completed.as_str().to_string(),
            video_id: Some(video_id),
            video_url: Some(video_url),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Payload for a failed job.
    pub fn failed(job_id: JobId, error: String) -> Self {
        Self {
            event: "failed".to_string(),
            job_id,
            status: JobStatus::Failed.as_str().to_string(),
            video_id: None,
            video_url: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    /// Fixed sample payload used by the test-webhook endpoint.
    pub fn sample() -> Self {
        Self {
            event: "test".to_string(),
            job_id: JobId::from("test-job-123"),
            status: "test".to_string(),
            video_id: Some("test-video-123".to_string()),
            video_url: Some(crate::job::watch_url("test-video-123")),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_events() {
        let json = r#"{"url": "https://example.com/hook"}"#;
        let config: WebhookConfig = serde_json::from_str(json).unwrap();
        assert!(config.subscribes_to("completed"));
        assert!(config.subscribes_to("failed"));
        assert!(!config.subscribes_to("test"));
    }

    #[test]
    fn test_explicit_event_filter() {
        let json = r#"{"url": "https://example.com/hook", "events": ["failed"]}"#;
        let config: WebhookConfig = serde_json::from_str(json).unwrap();
        assert!(config.subscribes_to("failed"));
        assert!(!config.subscribes_to("completed"));
    }

    #[test]
    fn test_failed_payload_shape() {
        let payload = WebhookPayload::failed(JobId::from("j1"), "boom".to_string());
        assert_eq!(payload.event, "failed");
        assert_eq!(payload.status, "failed");
        assert_eq!(payload.error.as_deref(), Some("boom"));
        assert!(payload.video_id.is_none());
    }

    #[test]
    fn test_payload_serialization_skips_none() {
        let payload = WebhookPayload::failed(JobId::from("j1"), "boom".to_string());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("video_id").is_none());
        assert_eq!(json["error"], "boom");
    }
}
