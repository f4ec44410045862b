//! Tracker and timeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{TrackerResult, TrackingError};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Suspect tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Default minimum confidence (0-100) for a detection to count
    pub confidence_threshold: f64,
    /// Frames per sequential batch
    pub batch_size: usize,
    /// Concurrent detection calls within a batch
    pub max_concurrent_detections: usize,
    /// Per-frame detection timeout
    pub detection_timeout: Duration,
    /// Per-call feature extraction timeout
    pub match_timeout: Duration,
    /// Minimum plausible time to move between two cameras
    pub min_transit_secs: f64,
    /// Results within this many points above the threshold are flagged
    pub low_margin: f64,
    /// Gap after which a return to the same location counts as a new visit
    pub revisit_gap_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 70.0,
            batch_size: 200,
            max_concurrent_detections: 8,
            detection_timeout: Duration::from_secs(30),
            match_timeout: Duration::from_secs(30),
            min_transit_secs: 10.0,
            low_margin: 5.0,
            revisit_gap_secs: 60.0,
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            confidence_threshold: env_or(
                "TRACKER_CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            batch_size: env_or("TRACKER_BATCH_SIZE", defaults.batch_size),
            max_concurrent_detections: env_or(
                "TRACKER_MAX_CONCURRENT_DETECTIONS",
                defaults.max_concurrent_detections,
            ),
            detection_timeout: Duration::from_secs(env_or(
                "TRACKER_DETECTION_TIMEOUT_SECS",
                defaults.detection_timeout.as_secs(),
            )),
            match_timeout: Duration::from_secs(env_or(
                "TRACKER_MATCH_TIMEOUT_SECS",
                defaults.match_timeout.as_secs(),
            )),
            min_transit_secs: env_or("TRACKER_MIN_TRANSIT_SECS", defaults.min_transit_secs),
            low_margin: env_or("TRACKER_LOW_MARGIN", defaults.low_margin),
            revisit_gap_secs: env_or("TRACKER_REVISIT_GAP_SECS", defaults.revisit_gap_secs),
        }
    }

    /// Same config with a different default threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn validate(&self) -> TrackerResult<()> {
        validate_threshold(self.confidence_threshold)?;
        if self.batch_size == 0 {
            return Err(TrackingError::invalid_argument("batch size must be positive"));
        }
        if self.max_concurrent_detections == 0 {
            return Err(TrackingError::invalid_argument(
                "max concurrent detections must be positive",
            ));
        }
        Ok(())
    }
}

/// Reject thresholds outside [0, 100].
pub fn validate_threshold(threshold: f64) -> TrackerResult<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(TrackingError::invalid_argument(format!(
            "confidence threshold {} is outside [0, 100]",
            threshold
        )));
    }
    Ok(())
}

/// Timeline generation configuration.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Same-video sightings closer than this are merged into one event
    pub merge_gap_secs: f64,
    /// Length of the evidence window for a single sighting
    pub clip_seconds: f64,
    /// Where thumbnails and clips are written
    pub media_dir: PathBuf,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            merge_gap_secs: 60.0,
            clip_seconds: 5.0,
            media_dir: PathBuf::from("./media"),
        }
    }
}

impl TimelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            merge_gap_secs: env_or("TIMELINE_MERGE_GAP_SECS", defaults.merge_gap_secs),
            clip_seconds: env_or("TIMELINE_CLIP_SECS", defaults.clip_seconds),
            media_dir: std::env::var("TIMELINE_MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.confidence_threshold, 70.0);
        assert_eq!(config.batch_size, 200);
        assert!(config.validate().is_ok());

        let timeline = TimelineConfig::default();
        assert_eq!(timeline.merge_gap_secs, 60.0);
        assert_eq!(timeline.clip_seconds, 5.0);
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(100.0).is_ok());
        assert!(validate_threshold(30.0).is_ok());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(100.5).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(TrackerConfig::default().with_threshold(150.0).validate().is_err());
    }
}
