//! Human-readable event descriptions.

use chrono::{DateTime, Utc};
use recon_models::TrackingResult;

/// Clock time as `HH:MM AM/PM`.
pub fn clock_time(at: DateTime<Utc>) -> String {
    at.format("%I:%M %p").to_string()
}

/// Confidence band: >= 90 high, >= 70 medium, otherwise low.
pub fn confidence_band(confidence: f64) -> &'static str {
    if confidence >= 90.0 {
        "high"
    } else if confidence >= 70.0 {
        "medium"
    } else {
        "low"
    }
}

/// Description of a single sighting.
pub fn describe_result(result: &TrackingResult) -> String {
    let mut text = format!("Suspect detected at {}", clock_time(result.timestamp));
    let position = result.position.trim();
    if !position.is_empty() {
        text.push_str(" at ");
        text.push_str(position);
    }
    text.push_str(&format!(
        " with {} confidence",
        confidence_band(result.confidence)
    ));
    let carrying: Vec<&str> = result
        .carrying
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    if !carrying.is_empty() {
        text.push_str(", carrying ");
        text.push_str(&carrying.join(", "));
    }
    text
}

/// Clause appended to an event description when a later sighting is merged.
pub fn merge_clause(at: DateTime<Utc>) -> String {
    format!(" and again at {}", clock_time(at))
}
