//! Evidence media for timeline events.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use recon_models::Video;
use tracing::debug;

use crate::clip::extract_clip;
use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::thumbnail::generate_thumbnail;

/// Produces thumbnails and clips for a window of a video.
///
/// Returned strings are media references (paths or URLs) stored on timeline
/// events.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Still image at `at_secs` into the video.
    async fn extract_frame(&self, video: &Video, at_secs: f64) -> MediaResult<String>;

    /// Clip covering `[start_secs, end_secs]`.
    async fn render_clip(&self, video: &Video, start_secs: f64, end_secs: f64)
        -> MediaResult<String>;
}

/// FFmpeg-backed extractor writing into a media directory.
#[derive(Debug, Clone)]
pub struct FfmpegMediaExtractor {
    media_dir: PathBuf,
    runner: FfmpegRunner,
}

impl FfmpegMediaExtractor {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
            runner: FfmpegRunner::new(),
        }
    }

    /// Use a runner with its own timeout.
    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    fn source<'a>(&self, video: &'a Video) -> MediaResult<&'a Path> {
        let path = video
            .file_path
            .as_deref()
            .map(Path::new)
            .ok_or_else(|| MediaError::MissingSource(video.id.to_string()))?;
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Ok(path)
    }

    fn thumbnail_path(&self, video: &Video, at_secs: f64) -> PathBuf {
        self.media_dir
            .join(format!("{}_thumb_{}.jpg", video.id, millis(at_secs)))
    }

    fn clip_path(&self, video: &Video, start_secs: f64, end_secs: f64) -> PathBuf {
        self.media_dir.join(format!(
            "{}_clip_{}_{}.mp4",
            video.id,
            millis(start_secs),
            millis(end_secs)
        ))
    }
}

fn millis(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

#[async_trait]
impl MediaExtractor for FfmpegMediaExtractor {
    async fn extract_frame(&self, video: &Video, at_secs: f64) -> MediaResult<String> {
        let source = self.source(video)?;
        tokio::fs::create_dir_all(&self.media_dir).await?;

        let output = self.thumbnail_path(video, at_secs);
        generate_thumbnail(source, &output, at_secs, &self.runner).await?;
        debug!(video_id = %video.id, "Thumbnail written to {}", output.display());

        Ok(output.to_string_lossy().into_owned())
    }

    async fn render_clip(
        &self,
        video: &Video,
        start_secs: f64,
        end_secs: f64,
    ) -> MediaResult<String> {
        let source = self.source(video)?;
        tokio::fs::create_dir_all(&self.media_dir).await?;

        let output = self.clip_path(video, start_secs, end_secs);
        extract_clip(source, &output, start_secs, end_secs, &self.runner).await?;

        Ok(output.to_string_lossy().into_owned())
    }
}
