//! Embedding provider abstraction and implementations.
//!
//! This module defines the interface for text embedding generation. Both the
//! indexer (paper abstracts) and the similarity searcher (questions) embed
//! through the same provider so that vectors share one space.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network or API communication error
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Invalid input text (e.g., empty)
    #[error("Invalid input text: {0}")]
    InvalidInput(String),

    /// The service answered with a payload we could not use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Trait for text embedding providers.
///
/// Implementors generate fixed-dimension vectors from text. Vectors are
/// recomputed on every call; there is no caching layer.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    ///
    /// # Arguments
    /// * `text` - The input text to embed
    ///
    /// # Returns
    /// A vector of exactly [`EmbeddingProvider::dimension`] f32 values
    ///
    /// # Errors
    /// Returns `EmbeddingError` if the embedding generation fails
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Get the dimension of embeddings produced by this provider.
    ///
    /// # Returns
    /// The number of dimensions in the embedding vectors
    fn dimension(&self) -> usize;

    /// Get the model name/identifier for this provider.
    fn model_name(&self) -> &str;
}

/// Normalizes text before it is stored or embedded.
///
/// Trims leading/trailing whitespace and collapses internal runs of
/// whitespace (including the hard line breaks found in arXiv abstracts) to a
/// single space. Case is preserved.
///
/// # Example
/// ```
/// use paper_rag::embedding::normalize_text;
///
/// assert_eq!(normalize_text("  Deep\n  Learning  "), "Deep Learning");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Hello World"), "Hello World");
        assert_eq!(normalize_text("  Multiple   Spaces  "), "Multiple Spaces");
        assert_eq!(normalize_text("line\nbreaks\tand tabs"), "line breaks and tabs");
        assert_eq!(normalize_text("   "), "");
    }
}
