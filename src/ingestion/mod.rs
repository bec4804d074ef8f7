//! Indexing of fetched papers into the vector index.
//!
//! For every paper the indexer embeds the abstract and upserts an
//! [`IndexRecord`] keyed by the paper identifier. All papers are processed
//! concurrently and the step succeeds only if every one of them does:
//!
//! - the first embedding or upsert failure fails the whole step;
//! - there is no per-paper retry;
//! - records already written are not rolled back, so a failed run can leave
//!   the index partially populated. Upsert semantics make a later run
//!   overwrite them.
//!
//! ```ignore
//! let indexer = Indexer::new(embedding_provider, index);
//! let stats = indexer.index_papers(&papers).await?;
//! println!("Indexed {} papers", stats.upserted);
//! ```

use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::models::{IndexRecord, Paper};
use crate::storage::{StorageError, VectorIndex};

/// Errors that can occur during indexing.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Embedding generation failed for a paper
    #[error("Embedding error for {id}: {source}")]
    EmbeddingError {
        id: String,
        #[source]
        source: EmbeddingError,
    },

    /// The index rejected an upsert
    #[error("Storage error for {id}: {source}")]
    StorageError {
        id: String,
        #[source]
        source: StorageError,
    },
}

/// Result type for indexing operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Statistics from an indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of records written to the index
    pub upserted: usize,
}

/// Embeds papers and writes them into a vector index.
pub struct Indexer<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    embedding_provider: Arc<E>,
    index: Arc<V>,
}

impl<E, V> Indexer<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    /// Create a new indexer.
    ///
    /// # Arguments
    /// * `embedding_provider` - Provider used to embed each abstract
    /// * `index` - Index receiving the records
    pub fn new(embedding_provider: Arc<E>, index: Arc<V>) -> Self {
        Self {
            embedding_provider,
            index,
        }
    }

    /// Embed and upsert a single paper.
    async fn index_paper(&self, paper: &Paper) -> IngestionResult<()> {
        let embedding = self
            .embedding_provider
            .embed(&paper.summary)
            .await
            .map_err(|source| IngestionError::EmbeddingError {
                id: paper.id.clone(),
                source,
            })?;

        self.index
            .upsert(IndexRecord::from_paper(paper, embedding))
            .await
            .map_err(|source| IngestionError::StorageError {
                id: paper.id.clone(),
                source,
            })?;

        debug!(id = %paper.id, "indexed paper");
        Ok(())
    }

    /// Index every paper concurrently, failing on the first error.
    ///
    /// # Errors
    /// Returns the first `IngestionError` raised by any paper
    pub async fn index_papers(&self, papers: &[Paper]) -> IngestionResult<IndexStats> {
        let results = try_join_all(papers.iter().map(|paper| self.index_paper(paper))).await?;

        let stats = IndexStats {
            upserted: results.len(),
        };
        info!(
            upserted = stats.upserted,
            index = self.index.name(),
            model = self.embedding_provider.model_name(),
            "indexed papers"
        );
        Ok(stats)
    }
}
