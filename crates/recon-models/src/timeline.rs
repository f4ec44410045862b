//! Timeline events derived from merged tracking results.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{AnalysisId, SuspectId, VideoId};

/// One or more tracking results merged by temporal proximity within a
/// single video.
///
/// `start_time` and `end_time` are offsets in seconds within the video;
/// `start_time <= end_time` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<AnalysisId>,
    pub suspect_id: SuspectId,
    pub video_id: VideoId,
    /// Wall-clock time of the first merged sighting
    pub timestamp: DateTime<Utc>,
    /// Highest confidence among merged sightings
    pub confidence: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub carrying: Vec<String>,
    /// Thumbnail reference; `None` when media extraction failed
    #[serde(default, alias = "thumbnailUrl")]
    pub thumbnail_ref: Option<String>,
    /// Clip reference; `None` when media extraction failed
    #[serde(default, alias = "clipUrl")]
    pub clip_ref: Option<String>,
    /// Tracking results folded into this event
    #[serde(default)]
    pub source_result_ids: Vec<String>,
}

impl TimelineEvent {
    /// Length of the event window in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Whether both media references are present.
    pub fn has_media(&self) -> bool {
        self.thumbnail_ref.is_some() && self.clip_ref.is_some()
    }
}
