//! Request and response types for the vision service.

use recon_models::{
    BoundingBox, DetectedPerson, EnvironmentContext, Graph, TimelineEvent,
};
use serde::{Deserialize, Serialize};

/// Image on disk, optionally restricted to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub path: String,
    pub region: Option<BoundingBox>,
}

impl ImageRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            region: None,
        }
    }

    pub fn region(path: impl Into<String>, region: BoundingBox) -> Self {
        Self {
            path: path.into(),
            region: Some(region),
        }
    }
}

/// Structured input handed to the narrative summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeInput {
    pub suspect_name: String,
    pub timeline: Vec<TimelineEvent>,
    pub graph: Graph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentContext>,
    /// Distinct locations in order of first appearance
    #[serde(default)]
    pub locations: Vec<String>,
    /// Distinct observed activities in order of first appearance
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub tracking_result_count: usize,
}

/// Kind of prose requested from the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    Summary,
    Narration,
}

/// Request body for `/detect`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetectRequest<'a> {
    pub frame_id: &'a str,
    pub image: String,
}

/// Response body for `/detect`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetectResponse {
    pub persons: Vec<DetectedPerson>,
}

/// Request body for `/features`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FeaturesRequest {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingBox>,
}

/// Response body for `/features`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FeaturesResponse {
    pub features: Vec<f32>,
}

/// Request body for `/summarize`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SummarizeRequest<'a> {
    pub style: SummaryStyle,
    pub language: &'a str,
    pub input: &'a NarrativeInput,
}

/// Response body for `/summarize`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SummarizeResponse {
    pub text: String,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}
