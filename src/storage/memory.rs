//! In-process vector index.
//!
//! Stores records in a concurrent map and answers queries by brute-force
//! cosine similarity. Data lives only as long as the process.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{QueryMatch, StorageError, StorageResult, VectorIndex};
use crate::models::IndexRecord;
use crate::query::cosine_similarity;

/// In-memory index with a fixed dimensionality.
#[derive(Debug)]
pub struct InMemoryIndex {
    dimension: usize,
    records: DashMap<String, (Vec<f32>, Value)>,
}

impl InMemoryIndex {
    /// Create an empty index accepting only `dimension`-sized vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: DashMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored vector for an identifier, if any.
    pub fn vector(&self, id: &str) -> Option<Vec<f32>> {
        self.records.get(id).map(|entry| entry.value().0.clone())
    }

    fn check_dimension(&self, actual: usize) -> StorageResult<()> {
        if actual != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, record: IndexRecord) -> StorageResult<()> {
        self.check_dimension(record.values.len())?;
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.records.insert(record.id, (record.values, metadata));
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> StorageResult<Vec<QueryMatch>> {
        self.check_dimension(vector.len())?;

        let mut matches: Vec<QueryMatch> = self
            .records
            .iter()
            .map(|entry| {
                let (values, metadata) = entry.value();
                QueryMatch {
                    id: entry.key().clone(),
                    score: Some(cosine_similarity(vector, values)),
                    metadata: Some(metadata.clone()),
                }
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
