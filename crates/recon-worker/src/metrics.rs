//! Worker metrics.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    pub const ANALYSES_STARTED_TOTAL: &str = "recon_analyses_started_total";
    pub const ANALYSES_COMPLETED_TOTAL: &str = "recon_analyses_completed_total";
    pub const ANALYSES_FAILED_TOTAL: &str = "recon_analyses_failed_total";
    pub const ANALYSES_IN_FLIGHT: &str = "recon_analyses_in_flight";
    pub const ANALYSIS_DURATION_SECONDS: &str = "recon_analysis_duration_seconds";

    /// Partial-output notes recorded on completed analyses, by stage.
    pub const DEGRADATIONS_TOTAL: &str = "recon_analysis_degradations_total";

    /// Videos sampled into frames before tracking.
    pub const VIDEOS_SAMPLED_TOTAL: &str = "recon_videos_sampled_total";
}

pub fn record_started() {
    counter!(names::ANALYSES_STARTED_TOTAL).increment(1);
    gauge!(names::ANALYSES_IN_FLIGHT).increment(1.0);
}

pub fn record_completed(duration_secs: f64) {
    counter!(names::ANALYSES_COMPLETED_TOTAL).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS).record(duration_secs);
    gauge!(names::ANALYSES_IN_FLIGHT).decrement(1.0);
}

pub fn record_failed(duration_secs: f64) {
    counter!(names::ANALYSES_FAILED_TOTAL).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS).record(duration_secs);
    gauge!(names::ANALYSES_IN_FLIGHT).decrement(1.0);
}

pub fn record_degradation(stage: &str) {
    counter!(names::DEGRADATIONS_TOTAL, "stage" => stage.to_string()).increment(1);
}

pub fn record_video_sampled(ok: bool) {
    let outcome = if ok { "ok" } else { "failed" };
    counter!(names::VIDEOS_SAMPLED_TOTAL, "outcome" => outcome).increment(1);
}
