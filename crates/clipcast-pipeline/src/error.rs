//! Pipeline error types.
//!
//! Each stage failure is an explicit variant so the orchestrator can
//! pattern-match the stage that failed when recording the terminal job
//! state. None of these ever propagate past the orchestrator.

use thiserror::Error;

use clipcast_media::MediaError;
use clipcast_publish::PublishError;
use clipcast_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    // The media errors already carry their own stage wording, so these
    // pass the message through untouched.
    #[error("{0}")]
    Download(#[source] MediaError),

    #[error("{0}")]
    Trim(#[source] MediaError),

    #[error("Upload failed: {0}")]
    Publish(#[from] PublishError),

    #[error("Thumbnail failed: {0}")]
    Thumbnail(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Short progress label written alongside the failure reason.
    pub fn progress_label(&self) -> &'static str {
        match self {
            PipelineError::Download(_) => "Download failed",
            PipelineError::Trim(_) => "Trimming failed",
            PipelineError::Publish(_) => "Upload failed",
            // Thumbnail errors never terminate a job; the label exists
            // only for completeness.
            PipelineError::Thumbnail(_) => "Thumbnail failed",
            PipelineError::Store(_) | PipelineError::Http(_) | PipelineError::Io(_) => {
                "Processing failed"
            }
        }
    }
}
