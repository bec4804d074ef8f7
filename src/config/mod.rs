//! Connection settings for the external collaborators.
//!
//! The library never reads the environment itself; binaries build these
//! structs (the `ask` binary does so from CLI flags with environment
//! fallbacks) and hand them to the client constructors.

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model used for keyword extraction and answer synthesis.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Default arXiv API root.
pub const DEFAULT_ARXIV_BASE_URL: &str = "http://export.arxiv.org";

/// Number of papers requested from arXiv per question.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Default Pinecone namespace.
pub const DEFAULT_NAMESPACE: &str = "papers";

/// Settings for the OpenAI completion and embedding endpoints.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub completion_model: String,
    pub embedding_model: String,

    /// Vector size produced by `embedding_model`; looked up from the known
    /// OpenAI models when unset
    pub embedding_dimension: Option<usize>,
}

impl OpenAIConfig {
    /// Settings with the default endpoint and models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a model other than the default, optionally pinning its dimension.
    ///
    /// Models served by OpenAI-compatible endpoints are not in the built-in
    /// dimension table and need `dimension` set.
    pub fn with_embedding_model(
        mut self,
        model: impl Into<String>,
        dimension: Option<usize>,
    ) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimension = dimension;
        self
    }
}

/// Settings for a Pinecone serverless index.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,

    /// Data-plane host of the index, e.g. `https://papers-abc123.svc.pinecone.io`
    pub index_host: String,

    pub namespace: String,
}

/// Settings for the arXiv metadata API.
#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub base_url: String,
    pub max_results: usize,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARXIV_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Strip a trailing slash so paths can be appended with `format!`.
pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_defaults() {
        let config = OpenAIConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.embedding_model, "text-embedding-3-small");

        assert_eq!(config.embedding_dimension, None);

        let config = config.with_base_url("http://localhost:1234/v1");
        assert_eq!(config.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_custom_embedding_model() {
        let config =
            OpenAIConfig::new("sk-test").with_embedding_model("nomic-embed-text", Some(768));
        assert_eq!(config.embedding_model, "nomic-embed-text");
        assert_eq!(config.embedding_dimension, Some(768));
    }

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("http://x/"), "http://x");
        assert_eq!(trim_base_url("http://x"), "http://x");
    }
}
