//! Tracking results: confirmed sightings of the suspect.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::BoundingBox;
use crate::ids::{AnalysisId, SuspectId, VideoId};

/// One above-threshold sighting of the suspect in a specific frame.
///
/// Exactly one result exists per matching detected person per frame.
/// After creation only the annotation fields (`behavior_notes`,
/// `identity_flags`) are ever appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResult {
    pub id: String,
    /// Analysis run that produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<AnalysisId>,
    pub suspect_id: SuspectId,
    pub video_id: VideoId,
    pub frame_id: String,
    pub frame_index: u32,
    /// Index of the matching person within the frame's detections
    #[serde(default)]
    pub detection_index: u32,
    pub timestamp: DateTime<Utc>,
    /// Seconds from the start of the video to this frame
    #[serde(default)]
    pub video_offset: f64,
    /// Match strength, 0-100
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frame_path: String,
    #[serde(default)]
    pub carrying: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub behavior_notes: Vec<String>,
    #[serde(default)]
    pub identity_flags: Vec<IdentityFlag>,
}

impl TrackingResult {
    /// Deterministic chronological order: timestamp, then video, frame and
    /// detection index.
    pub fn cmp_chronological(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.video_id.cmp(&other.video_id))
            .then_with(|| self.frame_index.cmp(&other.frame_index))
            .then_with(|| self.detection_index.cmp(&other.detection_index))
    }

    /// Append a behavior note unless an identical one is already present.
    pub fn add_behavior_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.behavior_notes.contains(&note) {
            self.behavior_notes.push(note);
        }
    }

    /// Append an identity flag unless an identical one is already present.
    pub fn add_identity_flag(&mut self, flag: IdentityFlag) {
        if !self.identity_flags.contains(&flag) {
            self.identity_flags.push(flag);
        }
    }

    /// Whether identity verification raised any concern.
    pub fn is_flagged(&self) -> bool {
        !self.identity_flags.is_empty()
    }
}

/// Sort results in place using [`TrackingResult::cmp_chronological`].
pub fn sort_chronologically(results: &mut [TrackingResult]) {
    results.sort_by(|a, b| a.cmp_chronological(b));
}

/// Concern raised by identity-consistency verification.
///
/// Flags never remove a result; they mark it for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityFlag {
    /// Seen at another camera too soon to have plausibly moved there.
    ConflictingSighting {
        other_result_id: String,
        other_location: String,
        gap_secs: f64,
    },
    /// Several people in the same frame matched the suspect.
    SharedFrame { candidates: u32 },
    /// Confidence cleared the threshold by less than the configured margin.
    LowMargin { margin: f64 },
}

impl IdentityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityFlag::ConflictingSighting { .. } => "conflicting_sighting",
            IdentityFlag::SharedFrame { .. } => "shared_frame",
            IdentityFlag::LowMargin { .. } => "low_margin",
        }
    }
}
