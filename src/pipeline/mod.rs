//! End-to-end orchestration of a research question.
//!
//! ```text
//! Start → Interpret → Fetch
//!   ├─ no papers ─→ FallbackSynthesize ─→ Done
//!   └─ papers ────→ Index → Search
//!                     ├─ no usable match ─→ FallbackSynthesize ─→ Done
//!                     └─ matches ─────────→ GroundedSynthesize ─→ Done
//! ```
//!
//! Any stage failure ends the run in `Failed`: the error names the stage, and
//! no partial answer is returned. Nothing is retried at this level.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::generation::{CompletionProvider, GenerationError};
use crate::ingestion::{IngestionError, Indexer};
use crate::interpreter::QueryInterpreter;
use crate::models::{Answer, Paper, SearchExpression};
use crate::provider::{PaperProvider, ProviderError};
use crate::query::{QueryError, SimilaritySearcher};
use crate::storage::{StorageError, VectorIndex};
use crate::synthesis::{AnswerSynthesizer, FallbackReason};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Interpret,
    Fetch,
    Index,
    Search,
    Synthesize,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Interpret => "interpret",
            PipelineStage::Fetch => "fetch",
            PipelineStage::Index => "index",
            PipelineStage::Search => "search",
            PipelineStage::Synthesize => "synthesize",
        };
        f.write_str(name)
    }
}

/// Failure of the completion/embedding collaborator.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Completion(#[from] GenerationError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Fatal failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The completion or embedding service failed or returned unusable output
    #[error("upstream generation failed during {stage}: {source}")]
    UpstreamGeneration {
        stage: PipelineStage,
        #[source]
        source: UpstreamError,
    },

    /// The paper metadata API failed or returned an unparseable payload
    #[error("paper retrieval failed: {0}")]
    Retrieval(#[source] ProviderError),

    /// The vector index rejected an upsert or query
    #[error("vector index failed during {stage}: {source}")]
    Index {
        stage: PipelineStage,
        #[source]
        source: StorageError,
    },
}

impl PipelineError {
    fn upstream(stage: PipelineStage, source: impl Into<UpstreamError>) -> Self {
        PipelineError::UpstreamGeneration {
            stage,
            source: source.into(),
        }
    }

    /// Stage at which the run failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::UpstreamGeneration { stage, .. }
            | PipelineError::Index { stage, .. } => *stage,
            PipelineError::Retrieval(_) => PipelineStage::Fetch,
        }
    }
}

impl From<IngestionError> for PipelineError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::EmbeddingError { source, .. } => {
                PipelineError::upstream(PipelineStage::Index, source)
            }
            IngestionError::StorageError { source, .. } => PipelineError::Index {
                stage: PipelineStage::Index,
                source,
            },
        }
    }
}

impl From<QueryError> for PipelineError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EmbeddingError(source) => {
                PipelineError::upstream(PipelineStage::Search, source)
            }
            QueryError::StorageError(source) => PipelineError::Index {
                stage: PipelineStage::Search,
                source,
            },
        }
    }
}

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that survives a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchAnswer {
    pub answer: Answer,
    pub search_expression: SearchExpression,

    /// Papers returned by the fetch stage, for display
    pub papers: Vec<Paper>,
}

/// The retrieval-augmented answering pipeline.
///
/// Collaborators are built once per process and shared by `Arc`; each call to
/// [`ResearchPipeline::answer`] is independent.
pub struct ResearchPipeline<C, E, P, V>
where
    C: CompletionProvider,
    E: EmbeddingProvider,
    P: PaperProvider,
    V: VectorIndex,
{
    interpreter: QueryInterpreter<C>,
    provider: P,
    indexer: Indexer<E, V>,
    searcher: SimilaritySearcher<E, V>,
    synthesizer: AnswerSynthesizer<C>,
}

impl<C, E, P, V> ResearchPipeline<C, E, P, V>
where
    C: CompletionProvider,
    E: EmbeddingProvider,
    P: PaperProvider,
    V: VectorIndex,
{
    /// Assemble the pipeline from its collaborators.
    ///
    /// # Arguments
    /// * `completion` - Shared by the interpreter and the synthesizer
    /// * `embedding` - Shared by the indexer and the searcher
    /// * `provider` - Source of candidate papers
    /// * `index` - Vector index written by the indexer and read by the searcher
    pub fn new(completion: Arc<C>, embedding: Arc<E>, provider: P, index: Arc<V>) -> Self {
        Self {
            interpreter: QueryInterpreter::new(completion.clone()),
            provider,
            indexer: Indexer::new(embedding.clone(), index.clone()),
            searcher: SimilaritySearcher::new(embedding, index),
            synthesizer: AnswerSynthesizer::new(completion),
        }
    }

    /// Answer a research question.
    ///
    /// # Errors
    /// Returns `PipelineError` naming the first stage that failed.
    pub async fn answer(&self, question: &str) -> PipelineResult<ResearchAnswer> {
        info!(stage = %PipelineStage::Interpret, "answering question");
        let search_expression = self
            .interpreter
            .interpret(question)
            .await
            .map_err(|e| PipelineError::upstream(PipelineStage::Interpret, e))?;

        info!(
            stage = %PipelineStage::Fetch,
            provider = self.provider.name(),
            expression = %search_expression
        );
        let papers = self
            .provider
            .fetch(&search_expression)
            .await
            .map_err(PipelineError::Retrieval)?;

        if papers.is_empty() {
            info!(stage = %PipelineStage::Synthesize, "no papers found, using fallback answer");
            let answer = self.fallback(question, FallbackReason::NothingFetched).await?;
            return Ok(ResearchAnswer {
                answer,
                search_expression,
                papers,
            });
        }

        info!(stage = %PipelineStage::Index, papers = papers.len());
        self.indexer.index_papers(&papers).await?;

        info!(stage = %PipelineStage::Search);
        let matches = self.searcher.search(question).await?;

        let answer = if matches.is_empty() {
            warn!("index returned no usable matches, using fallback answer");
            self.fallback(question, FallbackReason::NothingRetrieved).await?
        } else {
            info!(stage = %PipelineStage::Synthesize, sources = matches.len());
            self.synthesizer
                .synthesize_grounded(question, &matches)
                .await
                .map_err(|e| PipelineError::upstream(PipelineStage::Synthesize, e))?
        };

        Ok(ResearchAnswer {
            answer,
            search_expression,
            papers,
        })
    }

    async fn fallback(&self, question: &str, reason: FallbackReason) -> PipelineResult<Answer> {
        self.synthesizer
            .synthesize_fallback(question, reason)
            .await
            .map_err(|e| PipelineError::upstream(PipelineStage::Synthesize, e))
    }
}
