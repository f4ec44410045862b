//! CCTV video and extracted frame models.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;

/// Default frame sampling rate (frames per second of footage).
pub const DEFAULT_SAMPLE_FPS: f64 = 1.0;

/// A CCTV video feed registered for analysis.
///
/// Immutable once frame extraction completes; `processed` is set once
/// frames exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// Human-readable feed name
    #[serde(default)]
    pub name: String,

    /// Camera location label
    #[serde(default)]
    pub location: String,

    /// Wall-clock start time of the footage
    pub timestamp: DateTime<Utc>,

    /// Duration in seconds, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Path to the source video file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Sampling rate the frames were extracted at
    #[serde(default = "default_sample_fps")]
    pub sample_fps: f64,

    /// Extracted frames, ordered by frame index
    #[serde(default)]
    pub frames: Vec<Frame>,

    /// Whether frame extraction has completed
    #[serde(default)]
    pub processed: bool,
}

fn default_sample_fps() -> f64 {
    DEFAULT_SAMPLE_FPS
}

impl Video {
    /// Create a new, unprocessed video record.
    pub fn new(id: VideoId, location: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            location: location.into(),
            timestamp,
            duration: None,
            file_path: None,
            sample_fps: DEFAULT_SAMPLE_FPS,
            frames: Vec::new(),
            processed: false,
        }
    }

    /// Set the source file path.
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Attach extracted frames and mark the video processed.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.processed = !frames.is_empty();
        self.frames = frames;
        self
    }

    /// Whether any extracted frames are available.
    pub fn has_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Wall-clock timestamp of the frame at `frame_index`.
    pub fn frame_timestamp(&self, frame_index: u32) -> DateTime<Utc> {
        let fps = if self.sample_fps > 0.0 {
            self.sample_fps
        } else {
            DEFAULT_SAMPLE_FPS
        };
        let offset_ms = (frame_index as f64 / fps * 1000.0).round() as i64;
        self.timestamp + Duration::milliseconds(offset_ms)
    }

    /// Build the frame record for `frame_index` stored at `path`.
    pub fn frame(&self, frame_index: u32, path: impl Into<String>) -> Frame {
        Frame {
            frame_id: Frame::make_id(&self.id, frame_index),
            video_id: self.id.clone(),
            frame_index,
            timestamp: self.frame_timestamp(frame_index),
            path: path.into(),
        }
    }

    /// Seconds between the start of the footage and `at`, never negative.
    pub fn offset_secs(&self, at: DateTime<Utc>) -> f64 {
        let ms = (at - self.timestamp).num_milliseconds();
        (ms.max(0) as f64) / 1000.0
    }

    /// Location label, falling back to a camera label derived from the ID.
    pub fn location_label(&self) -> String {
        if self.location.trim().is_empty() {
            camera_label(&self.id)
        } else {
            self.location.clone()
        }
    }
}

/// Fallback label for a camera with no configured location.
pub fn camera_label(video_id: &VideoId) -> String {
    let id = video_id.as_str();
    let tail: String = id
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("Camera {}", tail)
}

/// A single frame extracted from a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Unique frame ID
    pub frame_id: String,
    /// Owning video
    pub video_id: VideoId,
    /// 0-based index, monotonic within the video
    pub frame_index: u32,
    /// Wall-clock time of the frame
    pub timestamp: DateTime<Utc>,
    /// Path to the extracted image
    pub path: String,
}

impl Frame {
    /// Stable frame ID for a video and frame index.
    pub fn make_id(video_id: &VideoId, frame_index: u32) -> String {
        format!("{}_frame_{:04}", video_id, frame_index)
    }
}
