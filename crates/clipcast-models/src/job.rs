//! Job lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a clip job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job status along the pipeline.
///
/// Transitions are monotonic along `Pending → Downloading → Trimming →
/// Uploading → Completed`; `Failed` is reachable from any non-terminal
/// status. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, pipeline not yet started
    #[default]
    Pending,
    /// Acquiring source media
    Downloading,
    /// Trimming the acquired media
    Trimming,
    /// Uploading the trimmed artifact
    Uploading,
    /// Published successfully
    Completed,
    /// A stage failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Trimming => "trimming",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Parse from the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "downloading" => Some(JobStatus::Downloading),
            "trimming" => Some(JobStatus::Trimming),
            "uploading" => Some(JobStatus::Uploading),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of one clip job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID, assigned at submission
    pub job_id: JobId,

    /// Current pipeline status
    pub status: JobStatus,

    /// Human-readable progress message, overwritten on every stage tick
    pub progress: String,

    /// Published video ID (set once publish succeeds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    /// Watch URL derived from `video_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Failure reason (set only when status is `failed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Set exactly when the job enters a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a freshly submitted job record.
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            progress: "Job created".to_string(),
            video_id: None,
            video_url: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Partial update applied to a stored job.
///
/// Only the fields that are `Some` are written; everything else keeps its
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<String>,
    pub video_id: Option<String>,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// Status plus progress message, the common stage-tick shape.
    pub fn status(status: JobStatus, progress: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress.into()),
            ..Default::default()
        }
    }

    /// Progress message only.
    pub fn progress(progress: impl Into<String>) -> Self {
        Self {
            progress: Some(progress.into()),
            ..Default::default()
        }
    }

    /// Terminal failure with a reason.
    pub fn failed(progress: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            progress: Some(progress.into()),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Terminal success carrying the published identifiers.
    pub fn completed(progress: impl Into<String>, video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        let video_url = watch_url(&video_id);
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(progress.into()),
            video_id: Some(video_id),
            video_url: Some(video_url),
            ..Default::default()
        }
    }
}

/// Derive the public watch URL for a published video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={}", video_id)
}
