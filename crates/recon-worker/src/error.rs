//! Worker error types.

use recon_media::MediaError;
use recon_models::ModelError;
use recon_store::StoreError;
use recon_tracking::TrackingError;
use recon_vision::VisionError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Vision service error: {0}")]
    Vision(#[from] VisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn analysis_failed(msg: impl Into<String>) -> Self {
        Self::AnalysisFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Store(e) => e.is_retryable(),
            WorkerError::Vision(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Whether the run stopped because the worker is shutting down.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Tracking(TrackingError::Cancelled))
    }
}
