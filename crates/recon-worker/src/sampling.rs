//! Frame sampling for videos that have not been processed yet.

use std::path::PathBuf;

use async_trait::async_trait;
use recon_media::{sample_frames, FfmpegRunner, MediaResult, SampleOptions, SampledFrames};
use recon_models::Video;

/// Produces the frame records for a video's footage.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Frames for `video`, timed at the rate reported in the result.
    async fn sample(&self, video: &Video) -> MediaResult<SampledFrames>;
}

/// FFmpeg-backed sampler writing into `{frames_dir}/{video_id}/`.
pub struct FfmpegFrameSampler {
    frames_dir: PathBuf,
    options: SampleOptions,
    runner: FfmpegRunner,
}

impl FfmpegFrameSampler {
    pub fn new(frames_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            options: SampleOptions::default(),
            runner: FfmpegRunner::new(),
        }
    }

    pub fn with_options(mut self, options: SampleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }
}

#[async_trait]
impl FrameSampler for FfmpegFrameSampler {
    async fn sample(&self, video: &Video) -> MediaResult<SampledFrames> {
        let dir = self.frames_dir.join(video.id.as_str());
        sample_frames(video, &dir, &self.options, &self.runner).await
    }
}
