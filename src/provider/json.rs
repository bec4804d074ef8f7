//! Offline snapshot provider backed by a JSON feed document.
//!
//! The document is the JSON rendition of an Atom feed, where `entry`, and each
//! entry's `author` and `category`, may be a single object or an array:
//!
//! ```json
//! { "entry": { "id": "http://arxiv.org/abs/1", "summary": "...",
//!              "author": { "name": "Ada" }, "category": [{ "term": "cs.LG" }] } }
//! ```
//!
//! Every normalized entry is returned for any expression; ranking is left to
//! the similarity search.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{normalize_records, PaperProvider, ProviderError, ProviderResult};
use crate::models::{OneOrMany, Paper, RawPaper, SearchExpression};

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    entry: OneOrMany<RawPaper>,
}

/// Serves papers from a JSON snapshot loaded at construction.
#[derive(Debug, Clone)]
pub struct JsonFeedProvider {
    name: String,
    papers: Vec<Paper>,
}

impl JsonFeedProvider {
    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    /// Returns `ProviderError::ParseError` if the document is not a feed
    pub fn parse(name: impl Into<String>, json: &str) -> ProviderResult<Self> {
        let name = name.into();
        let feed: JsonFeed =
            serde_json::from_str(json).map_err(|e| ProviderError::ParseError(e.to_string()))?;
        let papers = normalize_records(feed.entry.into_vec(), &name);
        Ok(Self { name, papers })
    }

    /// Load a snapshot from a file on disk.
    ///
    /// # Errors
    /// Returns `ProviderError::IoError` if the file cannot be read, or
    /// `ProviderError::ParseError` if it is not a feed
    pub async fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let json = tokio::fs::read_to_string(&path).await?;
        let provider = Self::parse(path.display().to_string(), &json)?;
        info!(path = %path.display(), count = provider.papers.len(), "loaded paper snapshot");
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

#[async_trait]
impl PaperProvider for JsonFeedProvider {
    async fn fetch(&self, _expression: &SearchExpression) -> ProviderResult<Vec<Paper>> {
        Ok(self.papers.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
