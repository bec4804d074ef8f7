//! OpenAI embedding provider implementation.
//!
//! This module provides an implementation of the `EmbeddingProvider` trait
//! using OpenAI's `/embeddings` endpoint (or any compatible server).

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use crate::config::{trim_base_url, OpenAIConfig};
use crate::http::{self, HttpError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "OpenAI embeddings";

/// OpenAI embedding provider.
///
/// Holds the credentials, model and a shared HTTP client injected by the caller.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    api_key: String,

    base_url: String,

    /// Model identifier (e.g., "text-embedding-3-small")
    model: String,

    /// Expected dimension of the embedding vectors
    embedding_dimension: usize,

    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Dimension of the vectors produced by a known OpenAI embedding model.
///
/// Unknown models fall back to [`crate::DEFAULT_EMBEDDING_DIMENSION`].
pub fn dimension_for_model(model: &str) -> usize {
    match model {
        "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        "text-embedding-ada-002" => 1536,
        _ => crate::DEFAULT_EMBEDDING_DIMENSION,
    }
}

impl OpenAIEmbedding {
    /// Create a new OpenAI embedding provider.
    ///
    /// # Arguments
    /// * `config` - API key, endpoint, embedding model and optional dimension
    /// * `http_client` - Shared reqwest client
    ///
    /// # Returns
    /// A provider expecting `config.embedding_dimension` floats per vector,
    /// or the size [`dimension_for_model`] reports when that is unset
    pub fn new(config: &OpenAIConfig, http_client: Client) -> Self {
        let embedding_dimension = config
            .embedding_dimension
            .unwrap_or_else(|| dimension_for_model(&config.embedding_model));

        Self {
            api_key: config.api_key.clone(),
            base_url: trim_base_url(&config.base_url),
            model: config.embedding_model.clone(),
            embedding_dimension,
            http_client,
        }
    }
}

impl From<HttpError> for EmbeddingError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode { .. } => EmbeddingError::InvalidResponse(err.to_string()),
            _ => EmbeddingError::ApiError(err.to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedding {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Text cannot be empty".to_string()));
        }

        let payload = serde_json::json!({
            "input": text,
            "model": self.model,
            "encoding_format": "float",
        });

        debug!(model = %self.model, chars = text.len(), "requesting embedding");

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| HttpError::transport(SERVICE, e))?;

        let body: EmbeddingResponse = http::read_json(response, SERVICE).await?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("missing data array".to_string()))?;

        if embedding.len() != self.embedding_dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} dimensions from {}, got {}",
                self.embedding_dimension,
                self.model,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_by_model() {
        let models_and_dims = vec![
            ("text-embedding-3-small", 1536),
            ("text-embedding-3-large", 3072),
            ("text-embedding-ada-002", 1536),
            ("unknown-model", 1536),
        ];

        for (model, expected) in models_and_dims {
            let mut config = OpenAIConfig::new("test-key");
            config.embedding_model = model.to_string();
            let provider = OpenAIEmbedding::new(&config, Client::new());
            assert_eq!(provider.dimension(), expected, "model {}", model);
            assert_eq!(provider.model_name(), model);
        }
    }

    #[test]
    fn test_configured_dimension_overrides_table() {
        let config =
            OpenAIConfig::new("test-key").with_embedding_model("nomic-embed-text", Some(768));
        let provider = OpenAIEmbedding::new(&config, Client::new());
        assert_eq!(provider.dimension(), 768);

        let config =
            OpenAIConfig::new("test-key").with_embedding_model("text-embedding-3-large", None);
        assert_eq!(OpenAIEmbedding::new(&config, Client::new()).dimension(), 3072);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_request() {
        let config = OpenAIConfig::new("test-key").with_base_url("http://127.0.0.1:9");
        let provider = OpenAIEmbedding::new(&config, Client::new());
        let result = provider.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }
}
