//! Paper provider module.
//!
//! This module defines the interface for retrieving candidate papers for a
//! search expression and includes implementations for different sources.
//!
//! Every provider normalizes what it parsed into canonical [`Paper`] records
//! before returning, so the rest of the pipeline never sees source-specific
//! shapes (scalar-vs-list fields, stray whitespace, missing optional values).

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::http::HttpError;
use crate::models::{Paper, RawPaper, SearchExpression};

pub mod arxiv;
pub mod json;

/// Errors that can occur when fetching papers from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Network or non-success HTTP status
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The API reported an error for the query
    #[error("API error: {0}")]
    ApiError(String),
}

impl From<HttpError> for ProviderError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode { .. } => ProviderError::ParseError(err.to_string()),
            _ => ProviderError::NetworkError(err.to_string()),
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for retrieving candidate papers.
///
/// # Design Notes
///
/// - One request per call: fixed page size, relevance ordering, no pagination
/// - Zero matches is an empty list, never an error
/// - Records that cannot be repaired are dropped, not fatal
#[async_trait]
pub trait PaperProvider: Send + Sync {
    /// Fetch the papers matching a search expression.
    ///
    /// # Errors
    /// Returns `ProviderError` on transport failure, non-success status, or an
    /// unparseable payload
    async fn fetch(&self, expression: &SearchExpression) -> ProviderResult<Vec<Paper>>;

    /// Get a human-readable name/description of this provider.
    ///
    /// This is useful for logging and debugging.
    fn name(&self) -> &str;
}

/// Normalize raw records, dropping those that cannot be repaired.
pub fn normalize_records(records: Vec<RawPaper>, source: &str) -> Vec<Paper> {
    records
        .into_iter()
        .filter_map(|raw| match raw.normalize() {
            Ok(paper) => Some(paper),
            Err(e) => {
                warn!(source, error = %e, "dropping malformed record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorField, OneOrMany};

    #[test]
    fn test_normalize_records_drops_unrepairable() {
        let good = RawPaper {
            id: Some("a".to_string()),
            summary: Some("abstract".to_string()),
            authors: OneOrMany::One(AuthorField::Name("X".to_string())),
            ..RawPaper::default()
        };
        let no_abstract = RawPaper {
            id: Some("b".to_string()),
            ..RawPaper::default()
        };
        let no_id = RawPaper {
            summary: Some("abstract".to_string()),
            ..RawPaper::default()
        };

        let papers = normalize_records(vec![good, no_abstract, no_id], "test");
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "a");
        assert_eq!(papers[0].authors, vec!["X".to_string()]);
    }
}
