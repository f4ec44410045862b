//! Tracking metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Frames sent to the person detector.
    pub const FRAMES_PROCESSED_TOTAL: &str = "tracking_frames_processed_total";

    /// Detection calls that produced no usable answer, by reason.
    pub const DETECTION_FAILURES_TOTAL: &str = "tracking_detection_failures_total";

    /// Detected persons whose features could not be compared.
    pub const MATCH_SKIPPED_TOTAL: &str = "tracking_match_skipped_total";

    /// Tracking results kept after thresholding.
    pub const RESULTS_TOTAL: &str = "tracking_results_total";

    /// Wall time of a tracking pass in seconds.
    pub const PASS_DURATION_SECONDS: &str = "tracking_pass_duration_seconds";
}

pub fn record_frames_processed(count: usize) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(count as u64);
}

pub fn record_detection_failure(reason: &'static str) {
    counter!(names::DETECTION_FAILURES_TOTAL, "reason" => reason).increment(1);
}

pub fn record_match_skipped(reason: &'static str) {
    counter!(names::MATCH_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_pass(results: usize, duration_secs: f64) {
    counter!(names::RESULTS_TOTAL).increment(results as u64);
    histogram!(names::PASS_DURATION_SECONDS).record(duration_secs);
}
