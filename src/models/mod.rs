//! Core data models for the research pipeline.
//!
//! This module contains the records that flow between pipeline stages: the raw
//! shape a corpus source produces, the canonical [`Paper`], the metadata
//! projection written into the vector index, and the synthesized [`Answer`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::normalize_text;

/// A structured search expression in the retrieval API's query grammar.
///
/// Produced once per question by the query interpreter and passed to the
/// corpus fetcher verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchExpression(String);

impl SearchExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SearchExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A field an upstream source may deliver either as a single value or as a list.
///
/// Feeds converted from XML carry one element as a scalar and several as an
/// array. Missing fields deserialize to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Widen to the canonical list shape.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// An author as delivered by a source: a bare name or a `{ "name": .. }` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorField {
    Name(String),
    Named { name: String },
}

impl AuthorField {
    fn into_name(self) -> String {
        match self {
            AuthorField::Name(name) | AuthorField::Named { name } => name,
        }
    }
}

/// A category tag as delivered by a source: a bare tag or a `{ "term": .. }` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    Tag(String),
    Term { term: String },
}

impl CategoryField {
    fn into_tag(self) -> String {
        match self {
            CategoryField::Tag(tag) | CategoryField::Term { term: tag } => tag,
        }
    }
}

/// A paper record exactly as a corpus source parsed it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPaper {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default, rename = "author")]
    pub authors: OneOrMany<AuthorField>,

    #[serde(default, rename = "category")]
    pub categories: OneOrMany<CategoryField>,

    #[serde(default)]
    pub published: Option<String>,

    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// Reasons a raw record cannot be repaired into a [`Paper`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDataError {
    /// The record has no usable identifier
    #[error("record has no identifier")]
    MissingIdentifier,

    /// The record has no abstract to embed
    #[error("record {0} has no abstract")]
    MissingAbstract(String),
}

impl RawPaper {
    /// Normalize into the canonical list-shaped [`Paper`].
    ///
    /// Scalar author and category values are widened to one-element lists and
    /// blank entries are removed. Records without an identifier or abstract
    /// cannot be repaired and are rejected.
    pub fn normalize(self) -> Result<Paper, MalformedDataError> {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(MalformedDataError::MissingIdentifier)?;

        let summary = self
            .summary
            .map(|s| normalize_text(&s))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| MalformedDataError::MissingAbstract(id.clone()))?;

        let authors = self
            .authors
            .into_vec()
            .into_iter()
            .map(|a| normalize_text(&a.into_name()))
            .filter(|a| !a.is_empty())
            .collect();

        let categories = self
            .categories
            .into_vec()
            .into_iter()
            .map(|c| c.into_tag().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Paper {
            id,
            title: self.title.map(|t| normalize_text(&t)).unwrap_or_default(),
            summary,
            authors,
            categories,
            published: self
                .published
                .map(|p| p.trim().to_string())
                .unwrap_or_default(),
            pdf_url: self.pdf_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Canonical metadata for a retrieved research paper.
///
/// The identifier is the stable external URI and acts as the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Stable external identifier (e.g. `http://arxiv.org/abs/2401.00001v1`)
    pub id: String,

    pub title: String,

    /// Abstract text
    pub summary: String,

    pub authors: Vec<String>,

    pub categories: Vec<String>,

    /// Publication timestamp as reported by the source
    pub published: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

/// Metadata projection of a [`Paper`] stored alongside its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published: String,
}

impl From<&Paper> for PaperMetadata {
    fn from(paper: &Paper) -> Self {
        Self {
            title: paper.title.clone(),
            summary: paper.summary.clone(),
            authors: paper.authors.clone(),
            categories: paper.categories.clone(),
            published: paper.published.clone(),
        }
    }
}

/// A vector plus metadata keyed by paper identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: PaperMetadata,
}

impl IndexRecord {
    pub fn from_paper(paper: &Paper, values: Vec<f32>) -> Self {
        Self {
            id: paper.id.clone(),
            values,
            metadata: PaperMetadata::from(paper),
        }
    }
}

/// A nearest-neighbour match returned by a similarity query.
///
/// The score is defined by the index; higher means more relevant, but it is
/// not guaranteed to be normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMatch {
    pub id: String,
    pub metadata: PaperMetadata,
    pub score: f32,
}

/// Which synthesis path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Answer grounded in retrieved papers
    Grounded,

    /// Fallback answer produced when retrieval found no papers
    NoResults,
}

/// Synthesized natural-language answer, returned verbatim from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
}

impl Answer {
    pub fn grounded(text: String) -> Self {
        Self {
            text,
            kind: AnswerKind::Grounded,
        }
    }

    pub fn no_results(text: String) -> Self {
        Self {
            text,
            kind: AnswerKind::NoResults,
        }
    }

    pub fn is_no_results(&self) -> bool {
        self.kind == AnswerKind::NoResults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(authors: OneOrMany<AuthorField>) -> RawPaper {
        RawPaper {
            id: Some("http://arxiv.org/abs/2401.00001v1".to_string()),
            title: Some("A  Study\n of Things".to_string()),
            summary: Some("  We study\n things. ".to_string()),
            authors,
            categories: OneOrMany::One(CategoryField::Term {
                term: "cs.LG".to_string(),
            }),
            published: Some("2024-01-01T00:00:00Z".to_string()),
            pdf_url: None,
        }
    }

    #[test]
    fn test_one_or_many_into_vec() {
        assert_eq!(OneOrMany::One(1).into_vec(), vec![1]);
        assert_eq!(OneOrMany::Many(vec![1, 2]).into_vec(), vec![1, 2]);
        assert!(OneOrMany::<i32>::default().into_vec().is_empty());
    }

    #[test]
    fn test_scalar_and_list_authors_normalize_alike() {
        let scalar = raw(OneOrMany::One(AuthorField::Named {
            name: "Ada Lovelace".to_string(),
        }))
        .normalize()
        .unwrap();
        let list = raw(OneOrMany::Many(vec![AuthorField::Name(
            "Ada Lovelace".to_string(),
        )]))
        .normalize()
        .unwrap();

        assert_eq!(scalar.authors, vec!["Ada Lovelace".to_string()]);
        assert_eq!(PaperMetadata::from(&scalar), PaperMetadata::from(&list));
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        let paper = raw(OneOrMany::default()).normalize().unwrap();
        assert_eq!(paper.title, "A Study of Things");
        assert_eq!(paper.summary, "We study things.");
        assert_eq!(paper.categories, vec!["cs.LG".to_string()]);
        assert!(paper.authors.is_empty());
    }

    #[test]
    fn test_normalize_rejects_missing_identifier() {
        let mut record = raw(OneOrMany::default());
        record.id = Some("   ".to_string());
        assert_eq!(
            record.normalize(),
            Err(MalformedDataError::MissingIdentifier)
        );
    }

    #[test]
    fn test_normalize_rejects_missing_abstract() {
        let mut record = raw(OneOrMany::default());
        record.summary = None;
        assert!(matches!(
            record.normalize(),
            Err(MalformedDataError::MissingAbstract(_))
        ));
    }

    #[test]
    fn test_raw_paper_from_json_shapes() {
        let scalar: RawPaper = serde_json::from_str(
            r#"{"id": "x", "summary": "s",
                "author": {"name": "A"}, "category": {"term": "cs.AI"}}"#,
        )
        .unwrap();
        let list: RawPaper = serde_json::from_str(
            r#"{"id": "x", "summary": "s", "author": [{"name": "A"}], "category": ["cs.AI"]}"#,
        )
        .unwrap();

        let scalar = scalar.normalize().unwrap();
        let list = list.normalize().unwrap();
        assert_eq!(scalar.authors, list.authors);
        assert_eq!(scalar.categories, list.categories);
    }

    #[test]
    fn test_answer_kind() {
        assert!(Answer::no_results("x".to_string()).is_no_results());
        assert!(!Answer::grounded("x".to_string()).is_no_results());
    }
}
