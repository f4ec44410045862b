//! Thumbnail extraction.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Thumbnail width in pixels; height follows the aspect ratio.
pub const THUMBNAIL_SCALE_WIDTH: u32 = 480;

/// Write a single scaled frame at `at_secs` into the video.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    at_secs: f64,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    runner
        .run(&thumbnail_command(video_path.as_ref(), output_path.as_ref(), at_secs))
        .await
}

fn thumbnail_command(video_path: &Path, output_path: &Path, at_secs: f64) -> FfmpegCommand {
    FfmpegCommand::new(video_path, output_path)
        .seek(at_secs.max(0.0))
        .single_frame()
        .video_filter(format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH))
        .output_arg("-q:v")
        .output_arg("3")
}
