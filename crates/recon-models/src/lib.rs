//! Shared data models for the Reconstruct backend.
//!
//! This crate provides Serde-serializable types for:
//! - Videos, frames and suspects (analysis inputs)
//! - Per-frame person detections and feature vectors
//! - Tracking results, timeline events and the knowledge graph (analysis outputs)
//! - Analysis requests and the persisted analysis job record

pub mod analysis;
pub mod detection;
pub mod error;
pub mod graph;
pub mod ids;
pub mod suspect;
pub mod timeframe;
pub mod timeline;
pub mod tracking;
pub mod video;

// Re-export common types
pub use analysis::{
    AnalysisOptions, AnalysisRecord, AnalysisRequest, AnalysisStatus, Degradation,
    EnvironmentContext, EnvironmentLocation,
};
pub use detection::{BoundingBox, DetectedPerson, FeatureVector};
pub use error::{ModelError, ModelResult};
pub use graph::{Graph, GraphEdge, GraphNode, NodeType};
pub use ids::{AnalysisId, SuspectId, VideoId};
pub use suspect::{AppearanceProfile, Suspect};
pub use timeframe::Timeframe;
pub use timeline::TimelineEvent;
pub use tracking::{IdentityFlag, TrackingResult};
pub use video::{Frame, Video};
