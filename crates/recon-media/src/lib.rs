//! FFmpeg CLI wrapper for CCTV footage.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeouts
//! - Source probing and frame sampling that feeds the frame store
//! - Thumbnail and clip extraction for timeline evidence, behind the
//!   [`MediaExtractor`] collaborator trait

pub mod clip;
pub mod command;
pub mod error;
pub mod extractor;
pub mod frames;
pub mod probe;
pub mod thumbnail;

pub use clip::extract_clip;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use extractor::{FfmpegMediaExtractor, MediaExtractor};
pub use frames::{sample_frames, SampleOptions, SampledFrames};
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::generate_thumbnail;
