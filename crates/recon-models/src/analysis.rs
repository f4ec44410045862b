//! Analysis requests and the persisted analysis job record.
//!
//! An analysis run moves through an explicit status machine:
//! `pending -> running -> {completed | failed}`. A run that cannot start
//! may also go straight from `pending` to `failed`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::{ModelError, ModelResult};
use crate::graph::Graph;
use crate::ids::{AnalysisId, SuspectId, VideoId};
use crate::timeframe::Timeframe;
use crate::timeline::TimelineEvent;

/// Request to track a suspect across a set of videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub suspect_id: SuspectId,

    #[validate(length(min = 1, message = "at least one video is required"))]
    pub video_ids: Vec<VideoId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,

    #[serde(default)]
    pub options: AnalysisOptions,

    /// Overrides the worker's default match threshold
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(suspect_id: SuspectId, video_ids: Vec<VideoId>) -> Self {
        Self {
            suspect_id,
            video_ids,
            timeframe: None,
            options: AnalysisOptions::default(),
            confidence_threshold: None,
        }
    }

    /// Validate field constraints and the timeframe window.
    pub fn validate_request(&self) -> ModelResult<()> {
        self.validate()?;
        if let Some(tf) = &self.timeframe {
            tf.validate()?;
        }
        if self.options.language.trim().is_empty() {
            return Err(ModelError::validation("language must not be empty"));
        }
        Ok(())
    }
}

/// Optional outputs requested alongside the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    #[serde(default)]
    pub include_narration: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_narration: false,
            language: default_language(),
        }
    }
}

/// Analysis run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Waiting for a worker
    #[default]
    Pending,
    /// Claimed by a worker
    Running,
    /// Finished with results
    Completed,
    /// Finished with an error recorded on the run
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        matches!(
            (self, next),
            (AnalysisStatus::Pending, AnalysisStatus::Running)
                | (AnalysisStatus::Pending, AnalysisStatus::Failed)
                | (AnalysisStatus::Running, AnalysisStatus::Completed)
                | (AnalysisStatus::Running, AnalysisStatus::Failed)
        )
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scene description used to enrich narrative generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentContext {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub locations: Vec<EnvironmentLocation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentLocation {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access_points: Vec<String>,
}

/// A partial-output condition recorded against a run that still completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Degradation {
    /// Pipeline stage, e.g. `timeline_media` or `summary`
    pub stage: String,
    /// Affected record, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl Degradation {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            subject: None,
            message: message.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Persisted record of one analysis run.
///
/// Always retrievable: a failed run keeps its error in `error_message` and
/// `summary` instead of being left in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub suspect_id: SuspectId,
    pub video_ids: Vec<VideoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub options: AnalysisOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub graph: Graph,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(default)]
    pub tracking_result_count: u32,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    /// Create a pending record for a request.
    pub fn new(id: AnalysisId, request: AnalysisRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            suspect_id: request.suspect_id,
            video_ids: request.video_ids,
            timeframe: request.timeframe,
            options: request.options,
            confidence_threshold: request.confidence_threshold,
            status: AnalysisStatus::Pending,
            timeline: Vec::new(),
            graph: Graph::empty(),
            summary: String::new(),
            narration: None,
            tracking_result_count: 0,
            degradations: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Check if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, rejecting transitions the status machine forbids.
    pub fn transition(&mut self, next: AnalysisStatus) -> ModelResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the run as claimed by a worker.
    pub fn start(&mut self) -> ModelResult<()> {
        self.transition(AnalysisStatus::Running)?;
        self.started_at = Some(self.updated_at);
        Ok(())
    }

    /// Mark the run completed with its outputs.
    pub fn complete(
        &mut self,
        timeline: Vec<TimelineEvent>,
        graph: Graph,
        summary: impl Into<String>,
        tracking_result_count: usize,
    ) -> ModelResult<()> {
        self.transition(AnalysisStatus::Completed)?;
        self.timeline = timeline;
        self.graph = graph;
        self.summary = summary.into();
        self.tracking_result_count = u32::try_from(tracking_result_count).unwrap_or(u32::MAX);
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Mark the run failed, recording the reason where callers can read it.
    pub fn fail(&mut self, error: impl Into<String>) -> ModelResult<()> {
        let error = error.into();
        self.transition(AnalysisStatus::Failed)?;
        self.summary = format!("Error during analysis: {}", error);
        self.error_message = Some(error);
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Whether a running record was started more than `max_age` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        if self.status != AnalysisStatus::Running {
            return false;
        }
        let since = self.started_at.unwrap_or(self.updated_at);
        now - since > max_age
    }

    /// Record a partial-output condition.
    pub fn degrade(&mut self, degradation: Degradation) {
        self.degradations.push(degradation);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            SuspectId::from("suspect-1"),
            vec![VideoId::from("video-1"), VideoId::from("video-2")],
        )
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate_request().is_ok());

        let mut empty = request();
        empty.video_ids.clear();
        assert!(matches!(empty.validate_request(), Err(ModelError::Validation(_))));

        let mut bad_threshold = request();
        bad_threshold.confidence_threshold = Some(120.0);
        assert!(bad_threshold.validate_request().is_err());

        let mut loose = request();
        loose.confidence_threshold = Some(30.0);
        assert!(loose.validate_request().is_ok());
    }

    #[test]
    fn test_status_machine_happy_path() {
        let mut record = AnalysisRecord::new(AnalysisId::new(), request());
        assert_eq!(record.status, AnalysisStatus::Pending);

        record.start().unwrap();
        assert_eq!(record.status, AnalysisStatus::Running);
        assert!(record.started_at.is_some());

        record
            .complete(Vec::new(), Graph::empty(), "done", 3)
            .unwrap();
        assert_eq!(record.status, AnalysisStatus::Completed);
        assert_eq!(record.tracking_result_count, 3);
        assert!(record.is_terminal());
    }

    #[test]
    fn test_failure_is_recorded_on_the_run() {
        let mut record = AnalysisRecord::new(AnalysisId::new(), request());
        record.fail("Suspect not found: suspect-1").unwrap();

        assert_eq!(record.status, AnalysisStatus::Failed);
        assert_eq!(
            record.error_message.as_deref(),
            Some("Suspect not found: suspect-1")
        );
        assert!(record.summary.contains("Suspect not found"));
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut record = AnalysisRecord::new(AnalysisId::new(), request());
        assert!(matches!(
            record.transition(AnalysisStatus::Completed),
            Err(ModelError::InvalidTransition { .. })
        ));

        record.start().unwrap();
        record.fail("boom").unwrap();
        assert!(record.start().is_err());
        assert!(record.fail("again").is_err());
    }

    #[test]
    fn test_only_long_running_records_are_stale() {
        let max_age = chrono::Duration::hours(1);
        let mut record = AnalysisRecord::new(AnalysisId::new(), request());
        let later = Utc::now() + chrono::Duration::hours(2);
        assert!(!record.is_stale(later, max_age));

        record.start().unwrap();
        assert!(!record.is_stale(Utc::now(), max_age));
        assert!(record.is_stale(later, max_age));

        record.fail("boom").unwrap();
        assert!(!record.is_stale(later, max_age));
    }

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let json = serde_json::json!({
            "suspectId": "suspect-123456",
            "videoIds": ["video-123456", "video-789012"],
            "timeframe": {"start": "2025-05-04T08:00:00Z", "end": "2025-05-04T09:00:00Z"},
            "options": {"includeNarration": true, "language": "en"}
        });
        let req: AnalysisRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.video_ids.len(), 2);
        assert!(req.options.include_narration);
        assert!(req.validate_request().is_ok());
    }
}
