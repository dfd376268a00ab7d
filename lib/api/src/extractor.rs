//! Client for the embedding extraction service.
//!
//! The service receives raw image bytes and answers
//! `{"embedding": [f32; D], "width": u32?, "height": u32?}`.

use futures_util::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use skulens_core::Embedding;
use std::time::Duration;
use tracing::debug;
use crate::error::ApiError;

/// Output of one extraction call.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub embedding: Embedding,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub trait EmbeddingExtractor: Send + Sync {
    fn extract<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Extracted, ApiError>>;
}

#[derive(Deserialize)]
struct ExtractResponse {
    embedding: Vec<f32>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// [`EmbeddingExtractor`] over HTTP.
#[derive(Clone)]
pub struct HttpExtractor {
    client: Client,
    endpoint: String,
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn request(&self, image: &[u8]) -> Result<Extracted, ApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            // 4xx from the extractor means the image itself was rejected
            if status.is_client_error() {
                return Err(ApiError::BadRequest(format!("Image validation failed: {}", body)));
            }
            return Err(ApiError::Upstream(format!("{} returned {}: {}", self.endpoint, status, body)));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("malformed extractor response: {}", e)))?;
        if parsed.embedding.is_empty() {
            return Err(ApiError::Upstream("extractor returned an empty embedding".to_string()));
        }

        debug!(dim = parsed.embedding.len(), bytes = image.len(), "features extracted");
        Ok(Extracted {
            embedding: Embedding::from_features(parsed.embedding),
            width: parsed.width,
            height: parsed.height,
        })
    }
}

impl EmbeddingExtractor for HttpExtractor {
    fn extract<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Extracted, ApiError>> {
        Box::pin(self.request(image))
    }
}
