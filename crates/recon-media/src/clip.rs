//! Evidence clip extraction.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Cut `[start_secs, end_secs]` from a video and re-encode it for playback.
pub async fn extract_clip(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    end_secs: f64,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let cmd = clip_command(input, output, start_secs, end_secs)?;

    info!(
        "Extracting clip: {} -> {} ({:.2}s..{:.2}s)",
        input.display(),
        output.display(),
        start_secs,
        end_secs
    );

    runner.run(&cmd).await
}

fn clip_command(
    input: &Path,
    output: &Path,
    start_secs: f64,
    end_secs: f64,
) -> MediaResult<FfmpegCommand> {
    if !start_secs.is_finite() || !end_secs.is_finite() || end_secs <= start_secs {
        return Err(MediaError::invalid_range(format!(
            "{:.3}..{:.3}",
            start_secs, end_secs
        )));
    }
    let start = start_secs.max(0.0);

    Ok(FfmpegCommand::new(input, output)
        .seek(start)
        .duration(end_secs - start)
        .video_codec("libx264")
        .preset("veryfast")
        .crf(23)
        .output_args(["-an", "-movflags", "+faststart"]))
}
