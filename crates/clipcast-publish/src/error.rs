//! Publish error types.

use thiserror::Error;

pub type PublishResult<T> = Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Upload access token not configured (set YOUTUBE_ACCESS_TOKEN)")]
    TokenMissing,

    #[error("Platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resumable session initiation returned no upload URL")]
    MissingSessionUri,

    #[error("Upload ended without the platform acknowledging completion")]
    Incomplete,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PublishError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
