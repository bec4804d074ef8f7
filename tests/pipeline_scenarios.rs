//! End-to-end runs of the pipeline over a JSON snapshot and an in-memory index.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paper_rag::{
    embedding::{EmbeddingProvider, EmbeddingResult},
    generation::{CompletionProvider, GenerationError, GenerationResult},
    provider::json::JsonFeedProvider,
    server::{AnswerRequest, ResearchService, GENERIC_FAILURE},
    storage::memory::InMemoryIndex,
    AnswerKind, ResearchPipeline,
};

const VOCABULARY: [&str; 4] = ["attention", "graph", "diffusion", "forecast"];

/// Completion stub: first call yields the search expression, later calls the answer.
struct RecordingCompletion {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingCompletion {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, prompt: &str) -> GenerationResult<String> {
        if self.fail {
            return Err(GenerationError::ApiError("quota exhausted".to_string()));
        }
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        if prompts.len() == 1 {
            Ok("all:\"attention\" OR all:\"forecasting\"".to_string())
        } else {
            Ok("## Answer\n\nSynthesized from sources.".to_string())
        }
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

/// Keyword-count embedding so similarity is predictable.
struct KeywordEmbedding;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32 + 0.01)
            .collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "keywords"
    }
}

fn feed(abstracts: &[&str]) -> String {
    let entries: Vec<serde_json::Value> = abstracts
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            serde_json::json!({
                "id": format!("http://arxiv.org/abs/2401.{:05}v1", i + 1),
                "title": format!("Paper {}", i + 1),
                "summary": summary,
                "author": { "name": format!("Author {}", i + 1) },
                "category": [{ "term": "cs.LG" }],
                "published": "2024-01-01T00:00:00Z",
            })
        })
        .collect();
    serde_json::json!({ "entry": entries }).to_string()
}

fn relevance_scores(prompt: &str) -> Vec<f32> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("Relevance Score: "))
        .map(|s| s.parse::<f32>().unwrap())
        .collect()
}

#[tokio::test]
async fn test_three_papers_grounded_answer() {
    let completion = Arc::new(RecordingCompletion::new());
    let index = Arc::new(InMemoryIndex::new(VOCABULARY.len()));
    let provider = JsonFeedProvider::parse(
        "snapshot",
        &feed(&[
            "Attention layers improve forecast accuracy; attention everywhere.",
            "Graph neural networks for molecules.",
            "Diffusion models for forecast uncertainty.",
        ]),
    )
    .unwrap();

    let pipeline = ResearchPipeline::new(
        completion.clone(),
        Arc::new(KeywordEmbedding),
        provider,
        index.clone(),
    );
    let result = pipeline
        .answer("How does attention help forecast time series?")
        .await
        .unwrap();

    assert_eq!(result.answer.kind, AnswerKind::Grounded);
    assert!(!result.answer.text.is_empty());
    assert_eq!(result.papers.len(), 3);
    assert_eq!(index.len(), 3);

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].ends_with("Question: How does attention help forecast time series?"));

    let scores = relevance_scores(&prompts[1]);
    assert_eq!(scores.len(), 3);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    // The attention-heavy abstract ranks first.
    let first = prompts[1].find("Title: Paper 1").unwrap();
    let second = prompts[1].find("Title: Paper 2").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_retrieval_capped_at_five() {
    let completion = Arc::new(RecordingCompletion::new());
    let index = Arc::new(InMemoryIndex::new(VOCABULARY.len()));
    let provider = JsonFeedProvider::parse(
        "snapshot",
        &feed(&[
            "attention",
            "attention attention forecast",
            "graph",
            "diffusion",
            "forecast forecast",
            "graph attention",
            "diffusion forecast",
            "attention diffusion graph forecast",
        ]),
    )
    .unwrap();

    let pipeline = ResearchPipeline::new(
        completion.clone(),
        Arc::new(KeywordEmbedding),
        provider,
        index.clone(),
    );
    let result = pipeline.answer("attention for forecast").await.unwrap();

    assert_eq!(result.papers.len(), 8);
    assert_eq!(index.len(), 8);

    let scores = relevance_scores(&completion.prompts()[1]);
    assert_eq!(scores.len(), 5);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_rerun_replaces_index_records() {
    let completion = Arc::new(RecordingCompletion::new());
    let index = Arc::new(InMemoryIndex::new(VOCABULARY.len()));
    let provider = JsonFeedProvider::parse("snapshot", &feed(&["attention", "graph"])).unwrap();

    let pipeline =
        ResearchPipeline::new(completion, Arc::new(KeywordEmbedding), provider, index.clone());
    pipeline.answer("attention").await.unwrap();
    pipeline.answer("graph").await.unwrap();

    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn test_no_papers_returns_fallback_response() {
    let completion = Arc::new(RecordingCompletion::new());
    let index = Arc::new(InMemoryIndex::new(VOCABULARY.len()));
    let provider = JsonFeedProvider::parse("empty", r#"{ "entry": [] }"#).unwrap();

    let service = ResearchService::new(ResearchPipeline::new(
        completion.clone(),
        Arc::new(KeywordEmbedding),
        provider,
        index.clone(),
    ));

    let response = service
        .handle(&AnswerRequest::new("xyzzy quantum basket weaving"))
        .await
        .unwrap();

    assert!(!response.answer.is_empty());
    assert!(response.papers.is_empty());
    assert_eq!(response.search_expression, "all:\"attention\" OR all:\"forecasting\"");
    assert!(index.is_empty());

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("no matching papers were found"));
}

#[tokio::test]
async fn test_missing_question_uses_default() {
    let completion = Arc::new(RecordingCompletion::new());
    let provider = JsonFeedProvider::parse("empty", r#"{ "entry": [] }"#).unwrap();
    let service = ResearchService::new(ResearchPipeline::new(
        completion.clone(),
        Arc::new(KeywordEmbedding),
        provider,
        Arc::new(InMemoryIndex::new(VOCABULARY.len())),
    ))
    .with_default_question("What is attention?");

    service.handle(&AnswerRequest::default()).await.unwrap();
    assert!(completion.prompts()[0].ends_with("Question: What is attention?"));
}

#[tokio::test]
async fn test_failure_yields_generic_error() {
    let completion = Arc::new(RecordingCompletion {
        prompts: Mutex::new(Vec::new()),
        fail: true,
    });
    let provider = JsonFeedProvider::parse("snapshot", &feed(&["attention"])).unwrap();
    let index = Arc::new(InMemoryIndex::new(VOCABULARY.len()));
    let service = ResearchService::new(ResearchPipeline::new(
        completion,
        Arc::new(KeywordEmbedding),
        provider,
        index.clone(),
    ));

    let err = service.handle(&AnswerRequest::new("anything")).await.unwrap_err();
    assert_eq!(err.error, GENERIC_FAILURE);
    assert!(index.is_empty());
}
