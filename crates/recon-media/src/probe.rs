//! Source inspection with ffprobe.
//!
//! Frame sampling probes a source before decoding it, so files without a
//! video stream are rejected early and the footage duration can be kept on
//! the video record.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// What ffprobe reports about a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Duration in seconds; `None` when the container does not report one
    pub duration_secs: Option<f64>,
    pub width: u32,
    pub height: u32,
    /// Native frame rate, when reported
    pub frame_rate: Option<f64>,
}

impl VideoInfo {
    /// Frames a sampling pass at `fps` can produce, capped at `max_frames`.
    pub fn expected_samples(&self, fps: f64, max_frames: u32) -> Option<u32> {
        let duration = self.duration_secs?;
        let frames = (duration * fps).ceil().max(0.0) as u64;
        Some(frames.min(u64::from(max_frames)) as u32)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Ask ffprobe for the first video stream of `path`.
pub async fn probe_video(path: &Path) -> MediaResult<VideoInfo> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let ffprobe = check_ffprobe()?;

    let mut cmd = Command::new(ffprobe);
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
        "-select_streams",
        "v:0",
    ])
    .arg(path)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
        .await
        .map_err(|_| MediaError::Timeout(PROBE_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::FfprobeFailed {
            message: format!("could not read {}", path.display()),
            stderr: Some(stderr).filter(|s| !s.is_empty()),
        });
    }

    let info = parse_report(&output.stdout)?;
    debug!(
        path = %path.display(),
        duration_secs = ?info.duration_secs,
        width = info.width,
        height = info.height,
        "Probed source"
    );
    Ok(info)
}

fn parse_report(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let report: ProbeReport = serde_json::from_slice(stdout)?;
    let stream = report
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::InvalidVideo("no video stream".to_string()))?;

    let duration_secs = report
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| parse_seconds(stream.duration.as_deref()));

    Ok(VideoInfo {
        duration_secs,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        frame_rate: stream.avg_frame_rate.as_deref().and_then(parse_rate),
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value?
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

/// `"num/den"` or a plain number; zero and undefined rates are `None`.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.parse::<f64>().ok()? / den
        }
        None => rate.parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}
