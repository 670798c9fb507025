//! Clip trimming.
//!
//! Stream-copy trimming bounded by wall-clock timecodes. No re-encode:
//! cuts land on keyframe boundaries, trading frame accuracy for speed and
//! zero quality loss.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Trim `input` to the `[start, end]` timecode range.
///
/// An inverted or out-of-range window is not pre-validated; ffmpeg's
/// non-zero exit is reported verbatim as the failure reason.
pub async fn trim_clip(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: &str,
    end: &str,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        "Trimming clip: {} -> {} ({} .. {})",
        input.display(),
        output.display(),
        start,
        end
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start)
        .stop(end)
        .codec_copy();

    FfmpegRunner::new().run(&cmd).await?;

    info!("Trim complete: {}", output.display());
    Ok(())
}
