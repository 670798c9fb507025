//! Per-job working files.
//!
//! Every file a job touches is named by its job_id so concurrently running
//! jobs never collide, and all of them are released on every exit path.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use clipcast_models::JobId;

/// Paths for one job's working files.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    /// Downloaded source media
    pub source_path: PathBuf,
    /// Trimmed clip
    pub clip_path: PathBuf,
    /// Raw thumbnail candidate (fetched bytes or extracted frame)
    pub frame_path: PathBuf,
    /// Normalized cover image
    pub thumb_path: PathBuf,
}

impl JobWorkspace {
    pub fn new(work_dir: &Path, job_id: &JobId) -> Self {
        Self {
            source_path: work_dir.join(format!("{}_source.mp4", job_id)),
            clip_path: work_dir.join(format!("{}_clip.mp4", job_id)),
            frame_path: work_dir.join(format!("{}_frame.png", job_id)),
            thumb_path: work_dir.join(format!("{}_thumb.jpg", job_id)),
        }
    }

    /// Remove every working file. Best-effort: files that were never
    /// created are a silent no-op, other failures are logged and swallowed.
    pub async fn cleanup(&self) {
        for path in [
            &self.source_path,
            &self.clip_path,
            &self.frame_path,
            &self.thumb_path,
        ] {
            match fs::remove_file(path).await {
                Ok(()) => debug!("Cleaned up file: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Error cleaning up file {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_paths_are_job_scoped() {
        let a = JobWorkspace::new(Path::new("/tmp/work"), &JobId::from("job-a"));
        let b = JobWorkspace::new(Path::new("/tmp/work"), &JobId::from("job-b"));
        assert_ne!(a.source_path, b.source_path);
        assert_ne!(a.clip_path, b.clip_path);
        assert!(a.source_path.to_string_lossy().contains("job-a"));
    }

    #[tokio::test]
    async fn test_cleanup_removes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let work = JobWorkspace::new(dir.path(), &JobId::from("job-c"));

        fs::write(&work.source_path, b"src").await.unwrap();
        fs::write(&work.clip_path, b"clip").await.unwrap();

        work.cleanup().await;

        assert!(!work.source_path.exists());
        assert!(!work.clip_path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_missing_files_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let work = JobWorkspace::new(dir.path(), &JobId::from("job-d"));

        // Nothing was ever created; cleanup must not error or panic.
        work.cleanup().await;
    }
}
