//! Binding between model types and store collections.

use recon_models::{AnalysisRecord, Suspect, TimelineEvent, TrackingResult, Video};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A model type persisted in its own collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn record_id(&self) -> String;
}

impl Record for Video {
    const COLLECTION: &'static str = "videos";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for Suspect {
    const COLLECTION: &'static str = "suspects";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Record for TrackingResult {
    const COLLECTION: &'static str = "tracking_results";

    fn record_id(&self) -> String {
        self.id.clone()
    }
}

impl Record for TimelineEvent {
    const COLLECTION: &'static str = "timeline_events";

    fn record_id(&self) -> String {
        self.id.clone()
    }
}

impl Record for AnalysisRecord {
    const COLLECTION: &'static str = "analyses";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
