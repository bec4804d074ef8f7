//! Similarity search over the vector index.
//!
//! This module embeds the user's question and asks the index for the nearest
//! paper records. Ranking is owned by the index: results come back most
//! similar first and are never re-sorted here.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paper_rag::config::OpenAIConfig;
//! use paper_rag::embedding::openai::OpenAIEmbedding;
//! use paper_rag::storage::memory::InMemoryIndex;
//! use paper_rag::query::SimilaritySearcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("sk-...");
//! let embedding = Arc::new(OpenAIEmbedding::new(&config, reqwest::Client::new()));
//! let index = Arc::new(InMemoryIndex::new(1536));
//! let searcher = SimilaritySearcher::new(embedding, index);
//!
//! for m in searcher.search("graph neural networks").await? {
//!     println!("{} - Score: {:.4}", m.metadata.title, m.score);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::models::{PaperMetadata, RetrievedMatch};
use crate::storage::{QueryMatch, StorageError, VectorIndex};

/// Number of nearest records requested per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Errors that can occur during similarity search.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    /// Index query failed
    #[error("Index error: {0}")]
    StorageError(#[from] StorageError),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Compute cosine similarity between two vectors.
///
/// Cosine similarity ranges from -1 to 1, where 1 means the vectors point in
/// the same direction. Vectors of different lengths, or with zero magnitude,
/// score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Turn a raw index hit into a match, or `None` if it lacks score or usable metadata.
fn into_retrieved(hit: QueryMatch) -> Option<RetrievedMatch> {
    let score = hit.score?;
    let metadata: PaperMetadata = serde_json::from_value(hit.metadata?).ok()?;
    Some(RetrievedMatch {
        id: hit.id,
        metadata,
        score,
    })
}

/// Embeds a question and retrieves the nearest paper records.
pub struct SimilaritySearcher<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    embedding_provider: Arc<E>,
    index: Arc<V>,
    top_k: usize,
}

impl<E, V> SimilaritySearcher<E, V>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    /// Create a searcher requesting [`DEFAULT_TOP_K`] records per question.
    ///
    /// # Arguments
    /// * `embedding_provider` - Must be the provider the index was filled with
    /// * `index` - Index to query
    pub fn new(embedding_provider: Arc<E>, index: Arc<V>) -> Self {
        Self {
            embedding_provider,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override how many nearest records are requested per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Search the index for the records nearest to the question.
    ///
    /// Hits missing a score or metadata are dropped silently.
    ///
    /// # Errors
    /// Returns `QueryError` if embedding or the index query fails
    pub async fn search(&self, question: &str) -> QueryResult<Vec<RetrievedMatch>> {
        let query_embedding = self.embedding_provider.embed(question).await?;
        let hits = self.index.query(&query_embedding, self.top_k).await?;

        let total = hits.len();
        let matches: Vec<RetrievedMatch> = hits.into_iter().filter_map(into_retrieved).collect();

        if matches.len() < total {
            debug!(dropped = total - matches.len(), "dropped incomplete index matches");
        }
        debug!(count = matches.len(), index = self.index.name(), "similarity search complete");

        Ok(matches)
    }
}
