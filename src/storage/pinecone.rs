//! Pinecone data-plane index.
//!
//! Talks to a serverless index host over HTTP. All reads and writes are scoped
//! to the configured namespace.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{QueryMatch, StorageError, StorageResult, VectorIndex};
use crate::config::{trim_base_url, PineconeConfig};
use crate::http::{self, HttpError};
use crate::models::IndexRecord;

const SERVICE: &str = "Pinecone";
const API_VERSION: &str = "2024-07";

/// Vector index backed by a Pinecone index host.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    api_key: String,
    host: String,
    namespace: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Value>,
}

impl PineconeIndex {
    /// Create a client for one index host.
    ///
    /// A host given without a scheme is reached over `https://`.
    pub fn new(config: &PineconeConfig, http_client: Client) -> Self {
        let host = trim_base_url(&config.index_host);
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Self {
            api_key: config.api_key.clone(),
            host,
            namespace: config.namespace.clone(),
            http_client,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn post(&self, path: &str, body: &Value) -> StorageResult<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| HttpError::transport(SERVICE, e))?;
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, record: IndexRecord) -> StorageResult<()> {
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let body = json!({
            "vectors": [{
                "id": record.id,
                "values": record.values,
                "metadata": metadata,
            }],
            "namespace": self.namespace,
        });

        let response = self.post("/vectors/upsert", &body).await?;
        http::check_status(response, SERVICE).await?;
        debug!(id = %record.id, namespace = %self.namespace, "upserted vector");
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> StorageResult<Vec<QueryMatch>> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.namespace,
        });

        let response = self.post("/query", &body).await?;
        let parsed: QueryResponse = http::read_json(response, SERVICE).await?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
