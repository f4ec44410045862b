//! Vision service HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use recon_models::{DetectedPerson, FeatureVector, Frame};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::collaborator::{FeatureExtractor, PersonDetector, Summarizer};
use crate::error::{VisionError, VisionResult};
use crate::types::{
    DetectRequest, DetectResponse, FeaturesRequest, FeaturesResponse, HealthResponse, ImageRef,
    NarrativeInput, SummarizeRequest, SummarizeResponse, SummaryStyle,
};

/// Configuration for the vision client.
#[derive(Debug, Clone)]
pub struct VisionClientConfig {
    /// Base URL of the vision service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Sent as `x-api-key` when set
    pub api_key: Option<String>,
}

impl Default for VisionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            api_key: None,
        }
    }
}

impl VisionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VISION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("VISION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("VISION_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            api_key: std::env::var("VISION_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

/// Client for the vision/LLM inference service.
pub struct VisionClient {
    http: Client,
    config: VisionClientConfig,
}

impl VisionClient {
    /// Create a new vision client.
    pub fn new(config: VisionClientConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionClientConfig::from_env())
    }

    pub fn config(&self) -> &VisionClientConfig {
        &self.config
    }

    /// Check if the vision service is healthy.
    pub async fn health_check(&self) -> VisionResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Vision service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Vision service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// POST `body` to `path` and decode a strictly typed response.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> VisionResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("Sending vision request to {}", url);

        let response = self
            .with_retry(|| async {
                let mut request = self.http.post(&url).json(body);
                if let Some(key) = &self.config.api_key {
                    request = request.header("x-api-key", key);
                }
                let response = request.send().await.map_err(|e| {
                    if e.is_timeout() {
                        VisionError::Timeout(self.config.timeout.as_secs())
                    } else {
                        VisionError::Network(e)
                    }
                })?;
                check_status(response).await
            })
            .await?;

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| VisionError::invalid_response(format!("{}: {}", path, e)))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> VisionResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = VisionResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Vision request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(VisionError::RequestFailed("Unknown error".to_string())))
    }
}

async fn check_status(response: Response) -> VisionResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(VisionError::ServiceUnavailable(format!(
            "vision service returned {}: {}",
            status, body
        )))
    } else {
        Err(VisionError::RequestFailed(format!(
            "vision service returned {}: {}",
            status, body
        )))
    }
}

/// Read an image from disk and base64-encode it.
async fn encode_image(path: &str) -> VisionResult<String> {
    if !Path::new(path).exists() {
        return Err(VisionError::ImageNotFound(path.to_string()));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(BASE64.encode(bytes))
}

#[async_trait]
impl PersonDetector for VisionClient {
    async fn detect_persons(&self, frame: &Frame) -> VisionResult<Vec<DetectedPerson>> {
        let image = encode_image(&frame.path).await?;
        let request = DetectRequest {
            frame_id: &frame.frame_id,
            image,
        };
        let response: DetectResponse = self.post_json("/detect", &request).await?;
        Ok(response.persons)
    }
}

#[async_trait]
impl FeatureExtractor for VisionClient {
    async fn extract_features(&self, image: &ImageRef) -> VisionResult<FeatureVector> {
        let request = FeaturesRequest {
            image: encode_image(&image.path).await?,
            region: image.region,
        };
        let response: FeaturesResponse = self.post_json("/features", &request).await?;
        if response.features.is_empty() {
            return Err(VisionError::invalid_response("empty feature vector"));
        }
        Ok(FeatureVector::new(response.features))
    }
}

#[async_trait]
impl Summarizer for VisionClient {
    async fn summarize(&self, input: &NarrativeInput) -> VisionResult<String> {
        let request = SummarizeRequest {
            style: SummaryStyle::Summary,
            language: "en",
            input,
        };
        let response: SummarizeResponse = self.post_json("/summarize", &request).await?;
        Ok(response.text)
    }

    async fn narrate(&self, input: &NarrativeInput, language: &str) -> VisionResult<String> {
        let request = SummarizeRequest {
            style: SummaryStyle::Narration,
            language,
            input,
        };
        let response: SummarizeResponse = self.post_json("/summarize", &request).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = VisionClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }

    #[tokio::test]
    async fn test_missing_image_is_reported() {
        let err = encode_image("/nonexistent/frame_0001.jpg").await.unwrap_err();
        assert!(matches!(err, VisionError::ImageNotFound(_)));
    }
}
