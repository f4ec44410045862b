//! Frame sampling for the frame store.
//!
//! Frames are written as `{video_id}_frame_{NNNN}.jpg`, numbered from 0, so
//! that a frame's index and its file agree with [`Frame::make_id`].

use std::path::{Path, PathBuf};

use recon_models::{Frame, Video};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Frame sampling settings.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Frames per second of footage
    pub fps: f64,
    /// Upper bound on frames per video
    pub max_frames: u32,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            fps: 1.0,
            max_frames: 1000,
        }
    }
}

/// Frames sampled from one video plus what was learned about its source.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrames {
    pub frames: Vec<Frame>,
    /// Rate the frames were sampled at
    pub sample_fps: f64,
    /// Source duration in seconds, when ffprobe reports one
    pub duration: Option<f64>,
}

impl SampledFrames {
    /// Attach the frames to `video` along with the rate they were timed at.
    pub fn apply_to(self, mut video: Video) -> Video {
        video.sample_fps = self.sample_fps;
        if self.duration.is_some() {
            video.duration = self.duration;
        }
        video.with_frames(self.frames)
    }
}

/// Sample frames from a video's source file into `frames_dir`.
///
/// The source is probed first; a file without a video stream is rejected
/// before decoding. Frames are ordered by index with
/// `timestamp = video.timestamp + index / fps`.
pub async fn sample_frames(
    video: &Video,
    frames_dir: &Path,
    options: &SampleOptions,
    runner: &FfmpegRunner,
) -> MediaResult<SampledFrames> {
    if !options.fps.is_finite() || options.fps <= 0.0 {
        return Err(MediaError::invalid_range(format!(
            "sample rate must be positive, got {}",
            options.fps
        )));
    }
    let source = video
        .file_path
        .as_deref()
        .ok_or_else(|| MediaError::MissingSource(video.id.to_string()))?;
    if !Path::new(source).exists() {
        return Err(MediaError::FileNotFound(PathBuf::from(source)));
    }

    let info = probe_video(Path::new(source)).await?;
    debug!(
        video_id = %video.id,
        expected = ?info.expected_samples(options.fps, options.max_frames),
        "Sampling source"
    );

    tokio::fs::create_dir_all(frames_dir).await?;

    let pattern = frames_dir.join(format!("{}_frame_%04d.jpg", video.id));
    let cmd = FfmpegCommand::new(source, &pattern)
        .video_filter(format!("fps={}", options.fps))
        .output_args(["-start_number", "0", "-q:v", "2"])
        .max_frames(options.max_frames);

    runner.run(&cmd).await?;

    let frames = collect_frames(video, frames_dir, options).await?;
    info!(
        video_id = %video.id,
        frames = frames.len(),
        "Sampled frames at {} fps",
        options.fps
    );
    Ok(SampledFrames {
        frames,
        sample_fps: options.fps,
        duration: info.duration_secs,
    })
}

/// Build frame records from sampled images already present in `frames_dir`.
pub async fn collect_frames(
    video: &Video,
    frames_dir: &Path,
    options: &SampleOptions,
) -> MediaResult<Vec<Frame>> {
    let mut timing = Video::new(video.id.clone(), "", video.timestamp);
    timing.sample_fps = options.fps;

    let prefix = format!("{}_frame_", video.id);
    let mut indexed = Vec::new();

    let mut entries = tokio::fs::read_dir(frames_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(index) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        indexed.push((index, entry.path()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.truncate(options.max_frames as usize);
    debug!(video_id = %video.id, "Found {} frame files", indexed.len());

    Ok(indexed
        .into_iter()
        .map(|(index, path)| timing.frame(index, path.to_string_lossy().into_owned()))
        .collect())
}
