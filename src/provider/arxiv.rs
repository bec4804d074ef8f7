//! arXiv Atom API provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{normalize_records, PaperProvider, ProviderError, ProviderResult};
use crate::config::{trim_base_url, ArxivConfig};
use crate::http::{self, HttpError};
use crate::models::{AuthorField, CategoryField, OneOrMany, Paper, RawPaper, SearchExpression};

const SERVICE: &str = "arXiv";

/// Marker in the id of the pseudo-entry arXiv returns for a rejected query.
const ERROR_ID_MARKER: &str = "/api/errors";

/// Fetches papers from `{base}/api/query`, most relevant first.
#[derive(Debug, Clone)]
pub struct ArxivProvider {
    base_url: String,
    max_results: usize,
    http_client: Client,
}

#[derive(Debug, Default, Deserialize)]
struct AtomFeed {
    #[serde(default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    author: Vec<AtomAuthor>,
    #[serde(default)]
    category: Vec<AtomCategory>,
    #[serde(default)]
    link: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

impl AtomEntry {
    fn is_api_error(&self) -> bool {
        self.id
            .as_deref()
            .is_some_and(|id| id.contains(ERROR_ID_MARKER))
    }

    fn into_raw(self) -> RawPaper {
        let pdf_url = self
            .link
            .into_iter()
            .find(|l| l.title.as_deref() == Some("pdf"))
            .map(|l| l.href);

        RawPaper {
            id: self.id,
            title: self.title,
            summary: self.summary,
            authors: OneOrMany::from(
                self.author
                    .into_iter()
                    .map(|a| AuthorField::Name(a.name))
                    .collect::<Vec<_>>(),
            ),
            categories: OneOrMany::from(
                self.category
                    .into_iter()
                    .map(|c| CategoryField::Tag(c.term))
                    .collect::<Vec<_>>(),
            ),
            published: self.published,
            pdf_url,
        }
    }
}

/// Parse an Atom feed body into normalized papers.
///
/// A feed without `<entry>` elements yields an empty list.
///
/// # Errors
/// `ProviderError::ParseError` for malformed XML, `ProviderError::ApiError`
/// when the feed carries arXiv's error entry.
pub fn parse_feed(xml: &str) -> ProviderResult<Vec<Paper>> {
    let feed: AtomFeed =
        quick_xml::de::from_str(xml).map_err(|e| ProviderError::ParseError(e.to_string()))?;

    if let Some(error) = feed.entry.iter().find(|e| e.is_api_error()) {
        return Err(ProviderError::ApiError(
            error
                .summary
                .clone()
                .unwrap_or_else(|| "query rejected".to_string()),
        ));
    }

    let raw = feed.entry.into_iter().map(AtomEntry::into_raw).collect();
    Ok(normalize_records(raw, SERVICE))
}

impl ArxivProvider {
    /// Create a provider for the arXiv API.
    ///
    /// # Arguments
    /// * `config` - API root and page size
    /// * `http_client` - Shared reqwest client
    pub fn new(config: &ArxivConfig, http_client: Client) -> Self {
        Self {
            base_url: trim_base_url(&config.base_url),
            max_results: config.max_results,
            http_client,
        }
    }
}

#[async_trait]
impl PaperProvider for ArxivProvider {
    async fn fetch(&self, expression: &SearchExpression) -> ProviderResult<Vec<Paper>> {
        let max_results = self.max_results.to_string();
        debug!(expression = %expression, max_results, "querying arXiv");

        let response = self
            .http_client
            .get(format!("{}/api/query", self.base_url))
            .query(&[
                ("search_query", expression.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| HttpError::transport(SERVICE, e))?;

        let body = http::read_text(response, SERVICE).await?;
        let papers = parse_feed(&body)?;

        info!(count = papers.len(), "fetched papers from arXiv");
        Ok(papers)
    }

    fn name(&self) -> &str {
        "arxiv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <link href="http://arxiv.org/api/query" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-05-01T00:00:00-04:00</updated>
  <opensearch:totalResults>2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <published>2024-01-01T00:00:00Z</published>
    <title>Transformers for
      Time Series</title>
    <summary>  We apply attention
  to forecasting. </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name><arxiv:affiliation>Bletchley</arxiv:affiliation></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related"
          type="application/pdf"/>
    <arxiv:primary_category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="stat.ML" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v2</id>
    <published>2024-01-02T00:00:00Z</published>
    <title>Single Author Paper</title>
    <summary>Only one author here.</summary>
    <author><name>Grace Hopper</name></author>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_many_entries() {
        let papers = parse_feed(TWO_ENTRIES).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "http://arxiv.org/abs/2401.00001v1");
        assert_eq!(first.title, "Transformers for Time Series");
        assert_eq!(first.summary, "We apply attention to forecasting.");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.categories, vec!["cs.LG", "stat.ML"]);
        assert_eq!(first.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2401.00001v1"));

        let second = &papers[1];
        assert_eq!(second.authors, vec!["Grace Hopper"]);
        assert_eq!(second.categories, vec!["cs.AI"]);
        assert_eq!(second.pdf_url, None);
    }

    #[test]
    fn test_parse_feed_without_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query</title>
  <id>http://arxiv.org/api/empty</id>
</feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_entry() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;
        match parse_feed(xml) {
            Err(ProviderError::ApiError(msg)) => assert!(msg.contains("incorrect id format")),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_feed("<feed><entry>"),
            Err(ProviderError::ParseError(_))
        ));
    }
}
