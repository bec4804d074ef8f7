//! Paper RAG - retrieval-augmented answers to research questions.
//!
//! This library answers a natural-language research question by retrieving
//! related papers from arXiv, indexing their abstracts for similarity search,
//! and synthesizing an answer grounded in the closest matches.
//!
//! # Architecture
//!
//! - **interpreter**: question → arXiv search expression (one completion call)
//! - **provider**: search expression → normalized papers (arXiv, JSON snapshot)
//! - **ingestion**: concurrent embed + upsert of every fetched paper
//! - **query**: question embedding → top-5 nearest index records
//! - **synthesis**: grounded or no-results answer (one completion call)
//! - **pipeline**: orchestration and the fatal error taxonomy
//! - **server**: request/response payloads for the answer operation
//!
//! Collaborators sit behind traits: [`CompletionProvider`],
//! [`EmbeddingProvider`], [`PaperProvider`] and [`VectorIndex`], with OpenAI,
//! arXiv, Pinecone and in-memory implementations.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use paper_rag::{
//!     config::{ArxivConfig, OpenAIConfig},
//!     embedding::openai::OpenAIEmbedding,
//!     generation::openai::OpenAICompletion,
//!     provider::arxiv::ArxivProvider,
//!     storage::memory::InMemoryIndex,
//!     ResearchPipeline,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = reqwest::Client::new();
//!     let openai = OpenAIConfig::new(std::env::var("OPENAI_API_KEY")?);
//!     let pipeline = ResearchPipeline::new(
//!         Arc::new(OpenAICompletion::new(&openai, http.clone())),
//!         Arc::new(OpenAIEmbedding::new(&openai, http.clone())),
//!         ArxivProvider::new(&ArxivConfig::default(), http),
//!         Arc::new(InMemoryIndex::new(1536)),
//!     );
//!
//!     let result = pipeline.answer("transformer architectures for time series").await?;
//!     println!("{}", result.answer.text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod ingestion;
pub mod interpreter;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod query;
pub mod server;
pub mod storage;
pub mod synthesis;

// Re-export commonly used types at the crate root
pub use embedding::EmbeddingProvider;
pub use generation::CompletionProvider;
pub use models::{Answer, AnswerKind, Paper, RetrievedMatch, SearchExpression};
pub use pipeline::{PipelineError, PipelineStage, ResearchAnswer, ResearchPipeline};
pub use provider::PaperProvider;
pub use storage::VectorIndex;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model name
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default embedding dimension for text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
