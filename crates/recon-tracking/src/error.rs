//! Tracking error types.

use recon_models::ModelError;
use recon_vision::VisionError;
use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackingError>;

/// Hard failures of a tracking pass.
///
/// Partial output (for example an event without a thumbnail) is not an
/// error; it is reported as a [`recon_models::Degradation`].
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Referenced suspect, video or frame is absent
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Detection, matching or summarization collaborator failed
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Tracking cancelled")]
    Cancelled,
}

impl TrackingError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }
}

impl From<ModelError> for TrackingError {
    fn from(e: ModelError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<VisionError> for TrackingError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::ImageNotFound(path) => Self::NotFound(format!("image {}", path)),
            other => Self::ExternalService(other.to_string()),
        }
    }
}
