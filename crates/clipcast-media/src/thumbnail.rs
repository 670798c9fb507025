//! Thumbnail extraction and normalization.
//!
//! The publish platform caps cover images at 2 MiB, so every candidate
//! (fetched or extracted from the clip) is scaled into a 1280x720
//! bounding box and re-encoded at decreasing JPEG quality until it fits.

use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Byte ceiling for the final cover image.
pub const THUMBNAIL_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Bounding box the image is scaled into (never upscaled).
pub const THUMBNAIL_BOX: (u32, u32) = (1280, 720);

/// Offset into the clip for auto-extracted frames.
pub const FRAME_OFFSET: &str = "00:00:02";

/// JPEG quality ladder (`-q:v`, 2 best .. 31 worst), tried in order until
/// the output fits under [`THUMBNAIL_MAX_BYTES`].
const QUALITY_STEPS: &[u8] = &[2, 5, 8, 12, 16, 20, 25, 31];

/// Extract a single frame from a video at [`FRAME_OFFSET`].
pub async fn extract_frame(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video_path.as_ref(), output_path.as_ref())
        .input_arg("-ss")
        .input_arg(FRAME_OFFSET)
        .single_frame();

    FfmpegRunner::new().run(&cmd).await
}

/// Scale filter fitting the source into the bounding box without upscaling.
fn box_filter() -> String {
    let (w, h) = THUMBNAIL_BOX;
    format!(
        "scale='min(iw,{})':'min(ih,{})':force_original_aspect_ratio=decrease",
        w, h
    )
}

/// Normalize an image into a bounded-size JPEG cover.
///
/// Re-encodes at each quality step until the result is under the byte
/// ceiling; errors only if even the lowest quality cannot fit.
pub async fn normalize_thumbnail(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let source = source.as_ref();
    let output = output.as_ref();
    let filter = box_filter();

    for &quality in QUALITY_STEPS {
        let cmd = FfmpegCommand::new(source, output)
            .video_filter(&filter)
            .quality(quality);

        FfmpegRunner::new().run(&cmd).await?;

        let size = fs::metadata(output).await?.len();
        if size <= THUMBNAIL_MAX_BYTES {
            info!(
                output = %output.display(),
                size_kb = size / 1024,
                quality,
                "Thumbnail normalized"
            );
            return Ok(());
        }

        debug!(
            size_kb = size / 1024,
            quality, "Thumbnail over size ceiling, lowering quality"
        );
    }

    Err(MediaError::Thumbnail(format!(
        "Could not fit thumbnail under {} bytes at lowest quality",
        THUMBNAIL_MAX_BYTES
    )))
}
