//! Pipeline orchestration.
//!
//! Drives a submitted job through acquisition, trim and publish, writing
//! every state transition to the job store before invoking the stage.
//! Submission is fire-and-forget: the caller gets the pending record back
//! immediately and the run proceeds on its own task. Any stage failure
//! terminates the job as `failed` with the stage's reason; the hosting
//! process never sees a pipeline panic.

use std::sync::Arc;

use reqwest::Client;
use tokio::fs;
use tracing::{error, info, warn};

use clipcast_media::{acquire_video, extract_frame, normalize_thumbnail, DownloadStrategy};
use clipcast_models::{watch_url, ClipRequest, Job, JobId, JobStatus, JobUpdate, WebhookPayload};
use clipcast_publish::{PublishMetadata, YoutubeClient};
use clipcast_store::{JobStore, StoreResult};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::webhook::WebhookDispatcher;
use crate::workspace::JobWorkspace;

/// Clip-and-publish pipeline.
///
/// Cheap to clone; clones share the store handle and HTTP clients. Each
/// job's run is an independent spawned task, so concurrent jobs share no
/// mutable state beyond the store.
#[derive(Clone)]
pub struct Pipeline {
    store: JobStore,
    publisher: YoutubeClient,
    dispatcher: WebhookDispatcher,
    http: Client,
    strategies: Arc<Vec<DownloadStrategy>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: JobStore,
        publisher: YoutubeClient,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(config.thumbnail_fetch_timeout)
            .build()?;

        Ok(Self {
            store,
            publisher,
            dispatcher: WebhookDispatcher::new()?,
            http,
            strategies: Arc::new(clipcast_media::default_strategies()),
            config,
        })
    }

    /// Replace the acquisition fallback ladder.
    pub fn with_strategies(mut self, strategies: Vec<DownloadStrategy>) -> Self {
        self.strategies = Arc::new(strategies);
        self
    }

    /// The dispatcher, for the test-webhook surface.
    pub fn dispatcher(&self) -> &WebhookDispatcher {
        &self.dispatcher
    }

    /// Create the job record and schedule its run.
    ///
    /// Returns the pending job immediately; the pipeline proceeds on a
    /// spawned task and is never awaited by the submission path.
    pub fn submit(&self, request: ClipRequest) -> StoreResult<Job> {
        let job = self.store.create(&Job::new(JobId::new()))?;
        metrics::counter!("clipcast_jobs_submitted_total").increment(1);

        info!(job_id = %job.job_id, url = %request.video_url, "Clip job submitted");

        let pipeline = self.clone();
        let job_id = job.job_id.clone();
        tokio::spawn(async move {
            pipeline.run(&job_id, &request).await;
        });

        Ok(job)
    }

    /// Run the full pipeline for one job.
    ///
    /// Writes the terminal state, notifies the webhook subscriber, and
    /// releases working files on every path out.
    pub async fn run(&self, job_id: &JobId, request: &ClipRequest) {
        let work = JobWorkspace::new(&self.config.work_dir, job_id);

        let outcome = self.run_stages(job_id, request, &work).await;

        match &outcome {
            Ok(video_id) => {
                metrics::counter!("clipcast_jobs_completed_total").increment(1);
                info!(job_id = %job_id, video_id = %video_id, "Clip job completed");
                if let Err(e) = self
                    .store
                    .update(job_id, &JobUpdate::completed("Upload completed", video_id))
                {
                    error!(job_id = %job_id, "Failed to record completion: {}", e);
                }
            }
            Err(e) => {
                metrics::counter!("clipcast_jobs_failed_total").increment(1);
                warn!(job_id = %job_id, "Clip job failed: {}", e);
                if let Err(store_err) = self
                    .store
                    .update(job_id, &JobUpdate::failed(e.progress_label(), e.to_string()))
                {
                    error!(job_id = %job_id, "Failed to record failure: {}", store_err);
                }
            }
        }

        if let Some(webhook) = &request.webhook {
            let payload = match &outcome {
                Ok(video_id) => WebhookPayload::completed(
                    job_id.clone(),
                    video_id.clone(),
                    watch_url(video_id),
                ),
                Err(e) => WebhookPayload::failed(job_id.clone(), e.to_string()),
            };
            let delivered = self.dispatcher.send(webhook, &payload).await;
            if !delivered {
                warn!(job_id = %job_id, "Webhook delivery did not succeed");
            }
        }

        work.cleanup().await;
    }

    /// The stage sequence. The first error wins; later stages do not run.
    async fn run_stages(
        &self,
        job_id: &JobId,
        request: &ClipRequest,
        work: &JobWorkspace,
    ) -> PipelineResult<String> {
        fs::create_dir_all(&self.config.work_dir).await?;

        // Acquisition
        self.store.update(
            job_id,
            &JobUpdate::status(JobStatus::Downloading, "Starting download..."),
        )?;
        {
            let store = self.store.clone();
            let id = job_id.clone();
            acquire_video(
                &request.video_url,
                &work.source_path,
                &self.strategies,
                move |attempt, total| {
                    store
                        .update(
                            &id,
                            &JobUpdate::progress(format!(
                                "Trying download strategy {} of {}...",
                                attempt, total
                            )),
                        )
                        .ok();
                },
            )
            .await
            .map_err(PipelineError::Download)?;
        }
        self.store
            .update(job_id, &JobUpdate::progress("Download completed"))?;

        // Transform
        self.store.update(
            job_id,
            &JobUpdate::status(JobStatus::Trimming, "Trimming video..."),
        )?;
        clipcast_media::trim_clip(
            &work.source_path,
            &work.clip_path,
            &request.start_time,
            &request.end_time,
        )
        .await
        .map_err(PipelineError::Trim)?;
        self.store
            .update(job_id, &JobUpdate::progress("Trimming completed"))?;

        // Publish
        self.store.update(
            job_id,
            &JobUpdate::status(JobStatus::Uploading, "Starting upload..."),
        )?;
        let meta = PublishMetadata {
            title: request.title.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            category_id: request.category_id.clone(),
            privacy_status: request.privacy_status,
        };
        let video_id = {
            let store = self.store.clone();
            let id = job_id.clone();
            self.publisher
                .upload_video(&work.clip_path, &meta, move |p| {
                    store
                        .update(&id, &JobUpdate::progress(format!("Uploading... {}%", p)))
                        .ok();
                })
                .await?
        };

        // Thumbnail is best-effort; the publish already succeeded.
        if let Err(e) = self.set_cover_image(request, work, &video_id).await {
            warn!(job_id = %job_id, "Skipping thumbnail: {}", e);
        }

        Ok(video_id)
    }

    /// Resolve, normalize and set the cover image.
    async fn set_cover_image(
        &self,
        request: &ClipRequest,
        work: &JobWorkspace,
        video_id: &str,
    ) -> PipelineResult<()> {
        let source = self.resolve_thumbnail_source(request, work).await?;

        normalize_thumbnail(&source, &work.thumb_path)
            .await
            .map_err(|e| PipelineError::Thumbnail(e.to_string()))?;

        self.publisher
            .set_thumbnail(video_id, &work.thumb_path)
            .await
            .map_err(|e| PipelineError::Thumbnail(e.to_string()))?;

        Ok(())
    }

    /// Thumbnail source precedence: caller-supplied URL first, frame
    /// extraction from the trimmed clip as the fallback (also taken when
    /// the fetch fails).
    async fn resolve_thumbnail_source(
        &self,
        request: &ClipRequest,
        work: &JobWorkspace,
    ) -> PipelineResult<std::path::PathBuf> {
        if let Some(url) = &request.thumbnail_url {
            match self.fetch_thumbnail_bytes(url).await {
                Ok(bytes) => {
                    fs::write(&work.frame_path, &bytes).await?;
                    return Ok(work.frame_path.clone());
                }
                Err(e) => {
                    warn!(
                        "Thumbnail URL fetch failed, falling back to frame extraction: {}",
                        e
                    );
                }
            }
        }

        extract_frame(&work.clip_path, &work.frame_path)
            .await
            .map_err(|e| PipelineError::Thumbnail(e.to_string()))?;
        Ok(work.frame_path.clone())
    }

    async fn fetch_thumbnail_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcast_models::WebhookConfig;
    use clipcast_store::Database;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_pipeline(work_dir: std::path::PathBuf) -> Pipeline {
        let store = JobStore::new(Database::open_in_memory().unwrap());
        let publisher = YoutubeClient::new("test-token").unwrap();
        let config = PipelineConfig {
            work_dir,
            ..Default::default()
        };
        Pipeline::new(store, publisher, config).unwrap()
    }

    fn doomed_request(webhook: Option<WebhookConfig>) -> ClipRequest {
        // .invalid never resolves, so acquisition exhausts every strategy
        // whether or not yt-dlp is installed on the machine.
        serde_json::from_value(serde_json::json!({
            "video_url": "https://source.invalid/watch?v=abc123def45",
            "start_time": "00:00:05",
            "end_time": "00:00:10",
            "webhook": webhook,
        }))
        .unwrap()
    }

    async fn wait_terminal(store: &JobStore, job_id: &JobId) -> Job {
        for _ in 0..600 {
            let job = store.get(job_id).unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn test_submit_returns_pending_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path().to_path_buf());

        let job = pipeline.submit(doomed_request(None)).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.completed_at.is_none());

        // The record is durable and queryable right away.
        let stored = pipeline.store.get(&job.job_id).unwrap();
        assert_eq!(stored.job_id, job.job_id);

        wait_terminal(&pipeline.store, &job.job_id).await;
    }

    #[tokio::test]
    async fn test_acquisition_failure_terminates_job() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path().to_path_buf());

        let job = pipeline.submit(doomed_request(None)).unwrap();
        let terminal = wait_terminal(&pipeline.store, &job.job_id).await;

        assert_eq!(terminal.status, JobStatus::Failed);
        assert!(terminal.completed_at.is_some());
        let error = terminal.error.expect("failed job must carry an error");
        assert!(!error.is_empty());
        assert!(terminal.video_id.is_none());

        // Cleanup runs after the terminal store write; give it a moment.
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Working files were released (none survive the run).
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_failure_webhook_is_delivered_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({"event": "failed"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path().to_path_buf());

        let webhook = WebhookConfig {
            url: format!("{}/hook", server.uri()),
            events: vec!["failed".to_string()],
            headers: None,
        };
        let job = pipeline.submit(doomed_request(Some(webhook))).unwrap();
        wait_terminal(&pipeline.store, &job.job_id).await;

        // Give the post-terminal webhook dispatch a moment to land; the
        // mock's expect(1) is verified when the server drops.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test]
    async fn test_completed_only_subscriber_not_notified_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path().to_path_buf());

        let webhook = WebhookConfig {
            url: format!("{}/hook", server.uri()),
            events: vec!["completed".to_string()],
            headers: None,
        };
        let job = pipeline.submit(doomed_request(Some(webhook))).unwrap();
        wait_terminal(&pipeline.store, &job.job_id).await;

        // expect(0) is verified when the server drops.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test]
    async fn test_progress_reflects_strategy_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(dir.path().to_path_buf());

        let job = pipeline.submit(doomed_request(None)).unwrap();
        let terminal = wait_terminal(&pipeline.store, &job.job_id).await;

        // When yt-dlp is present the last attempt recorded is the final
        // strategy; when absent the failure precedes any attempt.
        if terminal.error.as_deref().unwrap_or("").contains("strategies") {
            assert!(terminal
                .error
                .unwrap()
                .contains("All 3 download strategies failed"));
        }
    }
}
