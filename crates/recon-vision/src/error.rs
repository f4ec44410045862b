//! Vision client error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Vision service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response did not match the expected schema
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::ServiceUnavailable(_) | VisionError::Timeout(_) => true,
            VisionError::Network(e) => !e.is_decode(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(VisionError::ServiceUnavailable("503".into()).is_retryable());
        assert!(VisionError::Timeout(30).is_retryable());
        assert!(!VisionError::invalid_response("missing persons").is_retryable());
        assert!(!VisionError::ImageNotFound("/tmp/x.jpg".into()).is_retryable());
    }
}
