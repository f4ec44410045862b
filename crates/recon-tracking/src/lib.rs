//! Cross-video suspect tracking and event correlation.
//!
//! Turns per-frame person detections into a globally ordered,
//! confidence-scored list of suspect sightings, merges nearby sightings into
//! timeline events and derives a knowledge graph from them:
//!
//! ```text
//! frames -> PersonDetector -> SuspectTracker (+ matcher) -> TrackingResult[]
//!        TrackingResult[] -> merger -> TimelineBuilder -> TimelineEvent[]
//!        TrackingResult[] -> GraphBuilder -> Graph
//!        TimelineEvent[] + Graph -> NarrativeInput -> Summarizer
//! ```
//!
//! External collaborators (detection, feature extraction, media extraction,
//! summarization) are injected as trait objects.

pub mod annotate;
pub mod config;
pub mod describe;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod merger;
pub mod metrics;
pub mod narrative;
pub mod timeline;
pub mod tracker;

pub use config::{TimelineConfig, TrackerConfig};
pub use error::{TrackerResult, TrackingError};
pub use graph::GraphBuilder;
pub use matcher::similarity;
pub use merger::merge;
pub use narrative::{fallback_summary, narrative_input};
pub use timeline::{Timeline, TimelineBuilder};
pub use tracker::SuspectTracker;
