//! Health handlers.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

use clipcast_media::{check_ffmpeg, check_ytdlp};

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
}

/// GET /health
///
/// Liveness plus a probe of the external tools the pipeline shells out
/// to. Missing binaries degrade the service but do not fail the check.
pub async fn health() -> Json<HealthResponse> {
    let mut missing = Vec::new();
    if check_ffmpeg().is_err() {
        missing.push("ffmpeg");
    }
    if check_ytdlp().is_err() {
        missing.push("yt-dlp");
    }

    let response = if missing.is_empty() {
        HealthResponse {
            status: "healthy",
            message: "Clipcast service is running".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    } else {
        HealthResponse {
            status: "degraded",
            message: format!("Missing required binaries: {}", missing.join(", ")),
            timestamp: Utc::now().to_rfc3339(),
        }
    };

    Json(response)
}
