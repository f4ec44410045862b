//! Model validation errors.

use thiserror::Error;

use crate::analysis::AnalysisStatus;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ModelError {
    pub fn invalid_timeframe(msg: impl Into<String>) -> Self {
        Self::InvalidTimeframe(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<validator::ValidationErrors> for ModelError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
