//! Vector index abstraction and implementations.
//!
//! This module defines the interface to the similarity index that holds paper
//! vectors and their metadata. The abstraction allows for different backends
//! (a hosted Pinecone index, an in-process index for offline runs and tests)
//! behind one upsert/query API.

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpError;
use crate::models::IndexRecord;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Network failure or a non-success response from the index service
    #[error("Index request failed: {0}")]
    RequestError(String),

    /// Data serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A vector does not match the index's fixed dimensionality
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<HttpError> for StorageError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode { .. } => StorageError::SerializationError(err.to_string()),
            _ => StorageError::RequestError(err.to_string()),
        }
    }
}

/// Result type for index operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A raw nearest-neighbour hit as returned by the index.
///
/// Score and metadata are optional because remote indexes may omit either;
/// the similarity searcher decides what to do with incomplete hits.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub score: Option<f32>,
    pub metadata: Option<Value>,
}

/// Trait for vector index backends.
///
/// Consistency is last-write-wins per record identifier and is owned by the
/// backend.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the record with the same identifier.
    ///
    /// # Errors
    /// Returns `StorageError` if the index rejects the write
    async fn upsert(&self, record: IndexRecord) -> StorageResult<()>;

    /// Return up to `top_k` records nearest to `vector`, most similar first,
    /// with metadata and score.
    ///
    /// # Errors
    /// Returns `StorageError` if the query fails
    async fn query(&self, vector: &[f32], top_k: usize) -> StorageResult<Vec<QueryMatch>>;

    /// Backend name, for logging.
    fn name(&self) -> &str;
}
