//! Collaborators shared by every analysis run.

use std::path::Path;
use std::sync::Arc;

use recon_media::MediaExtractor;
use recon_models::{AnalysisRecord, EnvironmentContext, Suspect, TimelineEvent, TrackingResult, Video};
use recon_store::{RecordStore, Repository};
use recon_tracking::{TimelineConfig, TrackerConfig};
use recon_vision::{FeatureExtractor, PersonDetector, Summarizer};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::sampling::FrameSampler;

/// Everything an analysis needs besides the analysis record itself.
#[derive(Clone)]
pub struct AnalysisContext {
    pub config: WorkerConfig,
    pub tracker_config: TrackerConfig,
    pub timeline_config: TimelineConfig,
    pub store: Arc<dyn RecordStore>,
    pub detector: Arc<dyn PersonDetector>,
    pub extractor: Arc<dyn FeatureExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub sampler: Arc<dyn FrameSampler>,
    pub media: Option<Arc<dyn MediaExtractor>>,
    pub environment: Option<EnvironmentContext>,
}

impl AnalysisContext {
    pub fn analyses(&self) -> Repository<AnalysisRecord> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn suspects(&self) -> Repository<Suspect> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn videos(&self) -> Repository<Video> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn tracking_results(&self) -> Repository<TrackingResult> {
        Repository::new(Arc::clone(&self.store))
    }

    pub fn timeline_events(&self) -> Repository<TimelineEvent> {
        Repository::new(Arc::clone(&self.store))
    }
}

/// Read the site description used to enrich summaries.
pub async fn load_environment(path: &Path) -> WorkerResult<EnvironmentContext> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| {
        WorkerError::config_error(format!(
            "invalid environment context in {}: {}",
            path.display(),
            e
        ))
    })
}
