//! Service boundary for the answer operation.
//!
//! This module holds the request/response payloads exchanged with a
//! presentation layer and the [`ResearchService`] that turns pipeline outcomes
//! into them. Pipeline failures are logged in full and reported to the caller
//! as one generic error; no partial answer is ever returned.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::embedding::EmbeddingProvider;
use crate::generation::CompletionProvider;
use crate::models::Paper;
use crate::pipeline::{ResearchAnswer, ResearchPipeline};
use crate::provider::PaperProvider;
use crate::storage::VectorIndex;

/// Question used when the request carries none.
pub const DEFAULT_QUESTION: &str =
    "What are the latest advances in transformer architectures for time series forecasting?";

/// Message returned for any failed run.
pub const GENERIC_FAILURE: &str = "Failed to process your research question. Please try again.";

/// Request payload for the answer operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// The research question; blank or missing falls back to the service default
    #[serde(default)]
    pub question: Option<String>,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
        }
    }

    /// The question to run, substituting `default` when absent or blank.
    pub fn question_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(default)
    }
}

/// Response payload for a successful answer operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// Generated answer text (usually markdown)
    pub answer: String,

    pub search_expression: String,

    /// Papers returned by the fetch stage, in retrieval order
    pub papers: Vec<Paper>,
}

impl From<ResearchAnswer> for AnswerResponse {
    fn from(result: ResearchAnswer) -> Self {
        Self {
            answer: result.answer.text,
            search_expression: result.search_expression.into_inner(),
            papers: result.papers,
        }
    }
}

/// Response payload for a failed answer operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Answers requests with a shared pipeline.
pub struct ResearchService<C, E, P, V>
where
    C: CompletionProvider,
    E: EmbeddingProvider,
    P: PaperProvider,
    V: VectorIndex,
{
    pipeline: ResearchPipeline<C, E, P, V>,
    default_question: String,
}

impl<C, E, P, V> ResearchService<C, E, P, V>
where
    C: CompletionProvider,
    E: EmbeddingProvider,
    P: PaperProvider,
    V: VectorIndex,
{
    /// Wrap a pipeline, answering [`DEFAULT_QUESTION`] for empty requests.
    pub fn new(pipeline: ResearchPipeline<C, E, P, V>) -> Self {
        Self {
            pipeline,
            default_question: DEFAULT_QUESTION.to_string(),
        }
    }

    pub fn with_default_question(mut self, question: impl Into<String>) -> Self {
        self.default_question = question.into();
        self
    }

    /// Run the pipeline for a request.
    ///
    /// # Errors
    /// Returns a generic `ErrorResponse` if any stage fails.
    pub async fn handle(&self, request: &AnswerRequest) -> Result<AnswerResponse, ErrorResponse> {
        let question = request.question_or(&self.default_question);

        match self.pipeline.answer(question).await {
            Ok(result) => Ok(result.into()),
            Err(e) => {
                error!(stage = %e.stage(), error = %e, "research pipeline failed");
                Err(ErrorResponse {
                    error: GENERIC_FAILURE.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, SearchExpression};

    #[test]
    fn test_question_substitution() {
        let default = "default question";
        assert_eq!(AnswerRequest::default().question_or(default), default);
        assert_eq!(AnswerRequest::new("   ").question_or(default), default);
        assert_eq!(AnswerRequest::new(" real ").question_or(default), "real");
    }

    #[test]
    fn test_request_deserializes_without_question() {
        let request: AnswerRequest = serde_json::from_str("{}").unwrap();
        assert!(request.question.is_none());
    }

    #[test]
    fn test_response_uses_camel_case() {
        let response = AnswerResponse::from(ResearchAnswer {
            answer: Answer::no_results("fallback".to_string()),
            search_expression: SearchExpression::new("all:\"x\""),
            papers: Vec::new(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["answer"], "fallback");
        assert_eq!(json["searchExpression"], "all:\"x\"");
        assert_eq!(json["papers"], serde_json::json!([]));
    }
}
