//! Shared data models for the Clipcast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle status
//! - Clip requests and publish metadata
//! - Webhook configuration and payloads
//! - Timecode parsing helpers

pub mod job;
pub mod request;
pub mod timecode;
pub mod webhook;

// Re-export common types
pub use job::{watch_url, Job, JobId, JobStatus, JobUpdate};
pub use request::{ClipRequest, PrivacyStatus};
pub use timecode::{parse_timecode, TimecodeError};
pub use webhook::{WebhookConfig, WebhookPayload};
