//! YouTube upload client.
//!
//! Implements the platform's resumable upload protocol: a session is
//! initiated with the video metadata, then the artifact is PUT in bounded
//! chunks with `Content-Range` headers. The platform answers 308 for an
//! acknowledged intermediate chunk and 2xx with the video resource once the
//! final chunk lands. There is no automatic retry; a failed upload is a
//! resubmission by the caller.

use std::path::Path;

use reqwest::{redirect, Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use clipcast_models::PrivacyStatus;

use crate::error::{PublishError, PublishResult};

/// Chunk size for resumable uploads. The protocol requires a multiple of
/// 256 KiB for every chunk except the last.
pub const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Default API host.
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Metadata attached to the published video.
#[derive(Debug, Clone)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// Client for the video-hosting platform's upload API.
#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl YoutubeClient {
    /// Create a client with an explicit bearer token.
    pub fn new(access_token: impl Into<String>) -> PublishResult<Self> {
        // Redirects stay manual: the resumable protocol reuses 308 as a
        // chunk acknowledgment, which must not be followed.
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a client from `YOUTUBE_ACCESS_TOKEN`.
    pub fn from_env() -> PublishResult<Self> {
        let token = std::env::var("YOUTUBE_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(PublishError::TokenMissing)?;
        Self::new(token)
    }

    /// Override the API host (tests point this at a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upload a video file, reporting whole-percent progress after every
    /// acknowledged chunk. Returns the platform-assigned video ID.
    pub async fn upload_video<F>(
        &self,
        path: impl AsRef<Path>,
        meta: &PublishMetadata,
        mut on_progress: F,
    ) -> PublishResult<String>
    where
        F: FnMut(u8),
    {
        let path = path.as_ref();
        let total = tokio::fs::metadata(path).await?.len();

        info!(
            file = %path.display(),
            size_mb = total as f64 / (1024.0 * 1024.0),
            title = %meta.title,
            "Starting resumable upload"
        );

        let session_uri = self.initiate_session(meta, total).await?;
        debug!(session_uri = %session_uri, "Resumable session created");

        let mut file = File::open(path).await?;
        let mut offset: u64 = 0;
        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];

        loop {
            let read = read_chunk(&mut file, &mut buf).await?;
            if read == 0 {
                // File exhausted without a completion response.
                return Err(PublishError::Incomplete);
            }

            let chunk_end = offset + read as u64 - 1;
            let content_range = format!("bytes {}-{}/{}", offset, chunk_end, total);

            let response = self
                .http
                .put(&session_uri)
                .bearer_auth(&self.access_token)
                .header("Content-Range", &content_range)
                .body(buf[..read].to_vec())
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::PERMANENT_REDIRECT {
                // 308: chunk acknowledged, more expected.
                offset = chunk_end + 1;
                on_progress(percent(offset, total));
                continue;
            }

            if status.is_success() {
                on_progress(100);
                let resource: VideoResource =
                    serde_json::from_slice(&response.bytes().await?)?;
                info!(video_id = %resource.id, "Upload completed");
                return Ok(resource.id);
            }

            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::api(status.as_u16(), message));
        }
    }

    /// Set the cover image for a published video.
    pub async fn set_thumbnail(
        &self,
        video_id: &str,
        thumbnail_path: impl AsRef<Path>,
    ) -> PublishResult<()> {
        let bytes = tokio::fs::read(thumbnail_path.as_ref()).await?;

        let url = format!(
            "{}/upload/youtube/v3/thumbnails/set?videoId={}",
            self.base_url, video_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "image/jpeg")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(video_id = %video_id, "Thumbnail set");
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            warn!(video_id = %video_id, status = %status, "Thumbnail set rejected");
            Err(PublishError::api(status.as_u16(), message))
        }
    }

    /// Initiate a resumable session; returns the session URI to PUT
    /// chunks against.
    async fn initiate_session(
        &self,
        meta: &PublishMetadata,
        total_bytes: u64,
    ) -> PublishResult<String> {
        let url = format!(
            "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
            self.base_url
        );

        let body = json!({
            "snippet": {
                "title": meta.title,
                "description": meta.description,
                "tags": meta.tags,
                "categoryId": meta.category_id,
            },
            "status": {
                "privacyStatus": meta.privacy_status.as_str(),
                "selfDeclaredMadeForKids": false,
            },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", total_bytes.to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::api(status.as_u16(), message));
        }

        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or(PublishError::MissingSessionUri)
    }
}

/// Fill `buf` from the file, short only at EOF.
async fn read_chunk(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Whole-percent progress from acknowledged bytes.
fn percent(acked: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((acked * 100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_meta() -> PublishMetadata {
        PublishMetadata {
            title: "Clipped Video".to_string(),
            description: "This is a clipped segment.".to_string(),
            tags: vec!["clip".to_string()],
            category_id: "22".to_string(),
            privacy_status: PrivacyStatus::Unlisted,
        }
    }

    fn write_temp_file(size: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0xABu8; size]).unwrap();
        file.flush().unwrap();
        file
    }

    async fn mock_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/upload-session", server.uri()).as_str()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_single_chunk_upload() {
        let server = MockServer::start().await;
        mock_session(&server).await;

        Mock::given(method("PUT"))
            .and(path("/upload-session"))
            .and(header("Content-Range", "bytes 0-511/512"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid-small"})),
            )
            .mount(&server)
            .await;

        let file = write_temp_file(512);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let video_id = client
            .upload_video(file.path(), &sample_meta(), move |p| {
                seen_clone.lock().unwrap().push(p)
            })
            .await
            .unwrap();

        assert_eq!(video_id, "vid-small");
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_chunked_upload_reports_progress() {
        let server = MockServer::start().await;
        mock_session(&server).await;

        let total = 2 * UPLOAD_CHUNK_SIZE + 512;
        let last_start = 2 * UPLOAD_CHUNK_SIZE;

        // First two chunks are acknowledged with 308.
        for start in [0, UPLOAD_CHUNK_SIZE] {
            let range = format!(
                "bytes {}-{}/{}",
                start,
                start + UPLOAD_CHUNK_SIZE - 1,
                total
            );
            Mock::given(method("PUT"))
                .and(path("/upload-session"))
                .and(header("Content-Range", range.as_str()))
                .respond_with(ResponseTemplate::new(308))
                .mount(&server)
                .await;
        }

        // Final short chunk completes the upload.
        let final_range = format!("bytes {}-{}/{}", last_start, total - 1, total);
        Mock::given(method("PUT"))
            .and(path("/upload-session"))
            .and(header("Content-Range", final_range.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid-123"})),
            )
            .mount(&server)
            .await;

        let file = write_temp_file(total);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let video_id = client
            .upload_video(file.path(), &sample_meta(), move |p| {
                seen_clone.lock().unwrap().push(p)
            })
            .await
            .unwrap();

        assert_eq!(video_id, "vid-123");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        // Monotonic, ending at 100.
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_initiation_error_surfaces_as_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let file = write_temp_file(128);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        let err = client
            .upload_video(file.path(), &sample_meta(), |_| {})
            .await
            .unwrap_err();

        match err {
            PublishError::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("quota"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chunk_rejection_aborts_upload() {
        let server = MockServer::start().await;
        mock_session(&server).await;

        Mock::given(method("PUT"))
            .and(path("/upload-session"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let file = write_temp_file(256);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        let err = client
            .upload_video(file.path(), &sample_meta(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_set_thumbnail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/thumbnails/set"))
            .and(query_param("videoId", "vid-123"))
            .and(header("Content-Type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let file = write_temp_file(64);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        client.set_thumbnail("vid-123", file.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_thumbnail_rejection_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/thumbnails/set"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let file = write_temp_file(64);
        let client = YoutubeClient::new("test-token")
            .unwrap()
            .with_base_url(server.uri());

        let err = client
            .set_thumbnail("vid-123", file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Api { status: 403, .. }));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 100), 0);
        assert_eq!(percent(50, 100), 50);
        assert_eq!(percent(100, 100), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
