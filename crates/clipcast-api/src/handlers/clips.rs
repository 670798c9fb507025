//! Clip job handlers.
//!
//! The submission handler returns the pending job immediately; processing
//! continues on the pipeline's own task and is observed via the status
//! endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use clipcast_models::{
    parse_timecode, ClipRequest, Job, JobId, WebhookConfig, WebhookPayload,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Listing cap, newest jobs first.
const LIST_LIMIT: u32 = 100;

/// POST /api/clip
///
/// Create a new clip job. Returns 202 with the pending job record.
pub async fn create_clip(
    State(state): State<AppState>,
    Json(request): Json<ClipRequest>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    request.validate()?;

    // Timecode format is checked here; range ordering is not. An
    // inverted range surfaces later as a trim failure on the job.
    for (field, value) in [
        ("start_time", &request.start_time),
        ("end_time", &request.end_time),
    ] {
        if parse_timecode(value).is_err() {
            return Err(ApiError::bad_request(format!(
                "Invalid {}: expected HH:MM:SS, got {:?}",
                field, value
            )));
        }
    }

    let job = state.pipeline.submit(request)?;
    info!(job_id = %job.job_id, "Accepted clip job");

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/clip/jobs
///
/// List all clip jobs, most recently created first.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    let jobs = state.store.list(LIST_LIMIT)?;
    Ok(Json(jobs))
}

/// GET /api/clip/:job_id
///
/// Get the current state of a clip job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let job = state.store.get(&JobId::from(job_id))?;
    Ok(Json(job))
}

/// DELETE /api/clip/:job_id
///
/// Remove a job record. Does not stop an in-flight run.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store.delete(&JobId::from(job_id))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Job not found"))
    }
}

/// Response for the test-webhook endpoint.
#[derive(Debug, Serialize)]
pub struct TestWebhookResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub payload: WebhookPayload,
}

/// POST /api/clip/test-webhook
///
/// Deliver a fixed sample payload to the given webhook configuration and
/// report the outcome.
pub async fn test_webhook(
    State(state): State<AppState>,
    Json(config): Json<WebhookConfig>,
) -> ApiResult<Json<TestWebhookResponse>> {
    config.validate()?;

    let payload = WebhookPayload::sample();
    let delivered = state
        .pipeline
        .dispatcher()
        .deliver(&config, &payload)
        .await;

    if !delivered {
        return Err(ApiError::bad_request(
            "Failed to send test webhook. Check the server logs for more details.",
        ));
    }

    Ok(Json(TestWebhookResponse {
        status: "success",
        message: "Test webhook sent successfully",
        payload,
    }))
}
