//! Collaborator traits consumed by the tracking core.

use async_trait::async_trait;
use recon_models::{DetectedPerson, FeatureVector, Frame};

use crate::error::VisionResult;
use crate::types::{ImageRef, NarrativeInput};

/// Finds people in a single frame.
#[async_trait]
pub trait PersonDetector: Send + Sync {
    /// Detect zero or more people in `frame`.
    async fn detect_persons(&self, frame: &Frame) -> VisionResult<Vec<DetectedPerson>>;
}

/// Computes an appearance embedding for an image or an image region.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn extract_features(&self, image: &ImageRef) -> VisionResult<FeatureVector>;
}

/// Turns a timeline and graph into prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Factual summary of the suspect's movements.
    async fn summarize(&self, input: &NarrativeInput) -> VisionResult<String>;

    /// Detective-style narration in `language`.
    async fn narrate(&self, input: &NarrativeInput, language: &str) -> VisionResult<String>;
}
