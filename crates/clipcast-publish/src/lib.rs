//! Publish stage client for the external video-hosting platform.

pub mod error;
pub mod youtube;

pub use error::{PublishError, PublishResult};
pub use youtube::{PublishMetadata, YoutubeClient, UPLOAD_CHUNK_SIZE};
