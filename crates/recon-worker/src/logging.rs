//! Structured analysis logging.
//!
//! Every line carries the analysis ID and the stage it was emitted from, so
//! a single run can be followed through JSON logs.

use recon_models::AnalysisId;
use tracing::{error, info, warn, Span};

/// Lifecycle logger for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    analysis_id: String,
    stage: String,
}

impl AnalysisLogger {
    pub fn new(analysis_id: &AnalysisId, stage: &str) -> Self {
        Self {
            analysis_id: analysis_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Same analysis, different stage.
    pub fn stage(&self, stage: &str) -> Self {
        Self {
            analysis_id: self.analysis_id.clone(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            stage = %self.stage,
            "Analysis started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            stage = %self.stage,
            "Analysis progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            analysis_id = %self.analysis_id,
            stage = %self.stage,
            "Analysis warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            analysis_id = %self.analysis_id,
            stage = %self.stage,
            "Analysis error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            stage = %self.stage,
            "Analysis completed: {}", message
        );
    }

    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    pub fn stage_name(&self) -> &str {
        &self.stage
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "analysis",
            analysis_id = %self.analysis_id,
            stage = %self.stage
        )
    }
}
