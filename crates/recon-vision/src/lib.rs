//! Client for the vision/LLM inference service.
//!
//! The tracking core never talks to the service directly. It consumes the
//! narrow collaborator traits in [`collaborator`]; [`VisionClient`] is the
//! HTTP implementation used by the worker, and tests inject fakes.

pub mod client;
pub mod collaborator;
pub mod error;
pub mod types;

pub use client::{VisionClient, VisionClientConfig};
pub use collaborator::{FeatureExtractor, PersonDetector, Summarizer};
pub use error::{VisionError, VisionResult};
pub use types::{ImageRef, NarrativeInput, SummaryStyle};
