//! Clip request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::webhook::WebhookConfig;

/// Privacy level for the published video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    Private,
    #[default]
    Unlisted,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable input to a clip job.
///
/// Timecodes are wall-clock `HH:MM:SS[.mmm]` strings. The pipeline does not
/// pre-validate the range; an inverted range surfaces as a trim failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClipRequest {
    /// Source media URL
    #[validate(url)]
    pub video_url: String,

    /// Clip start timecode
    pub start_time: String,

    /// Clip end timecode
    pub end_time: String,

    /// Publish title
    #[serde(default = "default_title")]
    pub title: String,

    /// Publish description
    #[serde(default = "default_description")]
    pub description: String,

    /// Publish tags
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Platform category ID
    #[serde(default = "default_category_id")]
    pub category_id: String,

    /// Privacy level
    #[serde(default)]
    pub privacy_status: PrivacyStatus,

    /// Optional cover image source; when absent a frame is extracted
    /// from the trimmed clip instead
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub thumbnail_url: Option<String>,

    /// Optional outcome notification target
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub webhook: Option<WebhookConfig>,
}

fn default_title() -> String {
    "Clipped Video".to_string()
}

fn default_description() -> String {
    "This is a clipped segment.".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["clip".to_string()]
}

fn default_category_id() -> String {
    "22".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let json = r#"{
            "video_url": "https://youtube.com/watch?v=abc123def45",
            "start_time": "00:00:10",
            "end_time": "00:01:00"
        }"#;

        let request: ClipRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.title, "Clipped Video");
        assert_eq!(request.description, "This is a clipped segment.");
        assert_eq!(request.tags, vec!["clip"]);
        assert_eq!(request.category_id, "22");
        assert_eq!(request.privacy_status, PrivacyStatus::Unlisted);
        assert!(request.thumbnail_url.is_none());
        assert!(request.webhook.is_none());
    }

    #[test]
    fn test_request_validation_rejects_bad_url() {
        let request = ClipRequest {
            video_url: "not a url".to_string(),
            start_time: "00:00:10".to_string(),
            end_time: "00:01:00".to_string(),
            title: default_title(),
            description: default_description(),
            tags: default_tags(),
            category_id: default_category_id(),
            privacy_status: PrivacyStatus::default(),
            thumbnail_url: None,
            webhook: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_privacy_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PrivacyStatus::Unlisted).unwrap(),
            "\"unlisted\""
        );
    }
}
