//! Command-line entry point for asking research questions.
//!
//! Runs the full pipeline for one question, or for each line typed in
//! interactive mode, and prints the answer together with the papers arXiv
//! returned.
//!
//! # Examples
//!
//! Single question against a Pinecone index:
//! ```bash
//! ask --question "transformer architectures for time series"
//! ```
//!
//! Offline run over a JSON snapshot with an in-process index:
//! ```bash
//! ask --index memory --corpus-file papers.json --question "graph neural networks"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use paper_rag::{
    config::{
        ArxivConfig, OpenAIConfig, PineconeConfig, DEFAULT_ARXIV_BASE_URL,
        DEFAULT_COMPLETION_MODEL, DEFAULT_MAX_RESULTS, DEFAULT_NAMESPACE, DEFAULT_OPENAI_BASE_URL,
    },
    embedding::{openai::OpenAIEmbedding, EmbeddingProvider},
    generation::openai::OpenAICompletion,
    models::{IndexRecord, Paper, SearchExpression},
    provider::{arxiv::ArxivProvider, json::JsonFeedProvider, PaperProvider, ProviderResult},
    server::{AnswerRequest, AnswerResponse, ResearchService},
    storage::{
        memory::InMemoryIndex, pinecone::PineconeIndex, QueryMatch, StorageResult, VectorIndex,
    },
    ResearchPipeline, DEFAULT_EMBEDDING_MODEL,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wrapper enum for index backends to allow dynamic dispatch
enum DynamicIndex {
    Pinecone(PineconeIndex),
    Memory(InMemoryIndex),
}

#[async_trait]
impl VectorIndex for DynamicIndex {
    async fn upsert(&self, record: IndexRecord) -> StorageResult<()> {
        match self {
            DynamicIndex::Pinecone(i) => i.upsert(record).await,
            DynamicIndex::Memory(i) => i.upsert(record).await,
        }
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> StorageResult<Vec<QueryMatch>> {
        match self {
            DynamicIndex::Pinecone(i) => i.query(vector, top_k).await,
            DynamicIndex::Memory(i) => i.query(vector, top_k).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            DynamicIndex::Pinecone(i) => i.name(),
            DynamicIndex::Memory(i) => i.name(),
        }
    }
}

/// Wrapper enum for paper sources to allow dynamic dispatch
enum DynamicPaperProvider {
    Arxiv(ArxivProvider),
    Snapshot(JsonFeedProvider),
}

#[async_trait]
impl PaperProvider for DynamicPaperProvider {
    async fn fetch(&self, expression: &SearchExpression) -> ProviderResult<Vec<Paper>> {
        match self {
            DynamicPaperProvider::Arxiv(p) => p.fetch(expression).await,
            DynamicPaperProvider::Snapshot(p) => p.fetch(expression).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            DynamicPaperProvider::Arxiv(p) => p.name(),
            DynamicPaperProvider::Snapshot(p) => p.name(),
        }
    }
}

type Service =
    ResearchService<OpenAICompletion, OpenAIEmbedding, DynamicPaperProvider, DynamicIndex>;

/// Output format for answers
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Answer as markdown followed by a bulleted paper list
    Markdown,
    /// Answer followed by a table of papers
    Table,
    /// Machine-readable JSON response
    Json,
}

/// Vector index backend
#[derive(Debug, Clone, Copy, ValueEnum)]
enum IndexBackend {
    /// Hosted Pinecone index (requires PINECONE_API_KEY and PINECONE_INDEX_HOST)
    Pinecone,
    /// In-process index, discarded on exit
    Memory,
}

/// Answer research questions from arXiv papers
#[derive(Parser, Debug)]
#[command(
    name = "ask",
    version,
    about = "Answer research questions grounded in arXiv papers",
    long_about = "Turns a research question into an arXiv query, indexes the papers found, \
                  retrieves the closest abstracts and synthesizes an answer.

EXAMPLES:
  Single question:
    ask --question \"transformer architectures for time series\"

  JSON output:
    ask --question \"diffusion models for audio\" --format json

  Offline, over a JSON snapshot:
    ask --index memory --corpus-file papers.json --question \"graph neural networks\"

  Interactive mode:
    ask --interactive"
)]
struct Args {
    /// Research question (defaults to a sample question when omitted)
    #[arg(long, short = 'q', value_name = "TEXT", conflicts_with = "interactive")]
    question: Option<String>,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown")]
    format: OutputFormat,

    /// Vector index backend
    #[arg(long, value_enum, default_value = "pinecone")]
    index: IndexBackend,

    /// Serve papers from a JSON snapshot instead of the arXiv API
    #[arg(long, value_name = "FILE")]
    corpus_file: Option<PathBuf>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// OpenAI-compatible API root
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// Chat model for keyword extraction and synthesis
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_COMPLETION_MODEL)]
    completion_model: String,

    /// Embedding model for abstracts and questions
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Vector size of the embedding model; required for models outside the
    /// built-in OpenAI table
    #[arg(long, env = "OPENAI_EMBEDDING_DIMENSION", value_name = "N")]
    embedding_dimension: Option<usize>,

    /// Pinecone API key
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_api_key: Option<String>,

    /// Pinecone index host
    #[arg(long, env = "PINECONE_INDEX_HOST", value_name = "HOST")]
    pinecone_host: Option<String>,

    /// Pinecone namespace
    #[arg(long, env = "PINECONE_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pinecone_namespace: String,

    /// arXiv API root
    #[arg(long, env = "ARXIV_BASE_URL", default_value = DEFAULT_ARXIV_BASE_URL)]
    arxiv_base_url: String,

    /// Papers requested from arXiv per question
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn create_index(args: &Args, dimension: usize, http: reqwest::Client) -> Result<DynamicIndex> {
    match args.index {
        IndexBackend::Pinecone => {
            let api_key = args.pinecone_api_key.clone().with_context(|| {
                "PINECONE_API_KEY environment variable required for the Pinecone index.\n\
                 Set it, or use --index memory"
            })?;
            let index_host = args.pinecone_host.clone().with_context(|| {
                "PINECONE_INDEX_HOST environment variable required for the Pinecone index"
            })?;
            let config = PineconeConfig {
                api_key,
                index_host,
                namespace: args.pinecone_namespace.clone(),
            };
            info!(namespace = %config.namespace, "using Pinecone index");
            Ok(DynamicIndex::Pinecone(PineconeIndex::new(&config, http)))
        }
        IndexBackend::Memory => {
            info!(dimension, "using in-memory index");
            Ok(DynamicIndex::Memory(InMemoryIndex::new(dimension)))
        }
    }
}

async fn create_provider(args: &Args, http: reqwest::Client) -> Result<DynamicPaperProvider> {
    match &args.corpus_file {
        Some(path) => {
            let provider = JsonFeedProvider::from_file(path)
                .await
                .with_context(|| format!("Failed to load papers from {}", path.display()))?;
            Ok(DynamicPaperProvider::Snapshot(provider))
        }
        None => {
            let config = ArxivConfig {
                base_url: args.arxiv_base_url.clone(),
                max_results: args.max_results,
            };
            Ok(DynamicPaperProvider::Arxiv(ArxivProvider::new(&config, http)))
        }
    }
}

async fn build_service(args: &Args) -> Result<Service> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("paper-rag/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let mut openai = OpenAIConfig::new(args.openai_api_key.clone())
        .with_base_url(&args.openai_base_url)
        .with_embedding_model(&args.embedding_model, args.embedding_dimension);
    openai.completion_model = args.completion_model.clone();

    let completion = OpenAICompletion::new(&openai, http.clone());
    let embedding = OpenAIEmbedding::new(&openai, http.clone());
    info!(
        completion = %openai.completion_model,
        embedding = embedding.model_name(),
        dimension = embedding.dimension(),
        "OpenAI clients initialized"
    );

    let index = create_index(args, embedding.dimension(), http.clone())?;
    let provider = create_provider(args, http).await?;

    let pipeline = ResearchPipeline::new(
        Arc::new(completion),
        Arc::new(embedding),
        provider,
        Arc::new(index),
    );
    Ok(ResearchService::new(pipeline))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Format the papers as a pretty table
fn format_papers_table(papers: &[Paper]) -> String {
    if papers.is_empty() {
        return "No papers found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Categories").add_attribute(Attribute::Bold),
        Cell::new("Published").add_attribute(Attribute::Bold),
        Cell::new("Link").add_attribute(Attribute::Bold),
    ]);

    for (idx, paper) in papers.iter().enumerate() {
        let published = paper.published.split('T').next().unwrap_or_default();
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(truncate(&paper.title, 60)),
            Cell::new(truncate(&paper.authors.join(", "), 40)),
            Cell::new(paper.categories.join(", ")),
            Cell::new(published),
            Cell::new(&paper.id),
        ]);
    }

    table.to_string()
}

/// Format the papers as a markdown list
fn format_papers_markdown(papers: &[Paper]) -> String {
    if papers.is_empty() {
        return "_No papers found._".to_string();
    }

    papers
        .iter()
        .map(|p| {
            let link = p.pdf_url.as_deref().unwrap_or(&p.id);
            format!("- [{}]({}) - {}", p.title, link, p.authors.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_response(response: &AnswerResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(response)
                .context("Failed to serialize response to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Markdown => {
            println!("{}\n", response.answer);
            println!("## Papers\n");
            println!("{}", format_papers_markdown(&response.papers));
            println!("\n_Search query: `{}`_", response.search_expression.trim());
        }
        OutputFormat::Table => {
            println!("{}\n", response.answer);
            println!("{}", format_papers_table(&response.papers));
            println!("\nSearch query: {}", response.search_expression.trim());
        }
    }
    Ok(())
}

async fn run_single_question(
    service: &Service,
    question: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let request = AnswerRequest { question };
    let start = Instant::now();

    let response = service
        .handle(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.error))?;

    debug!(elapsed = ?start.elapsed(), "question answered");
    print_response(&response, format)
}

fn print_help() {
    println!("Commands:");
    println!("  <question>       - Ask a research question");
    println!("  /format markdown - Use markdown output format");
    println!("  /format table    - Use table output format");
    println!("  /format json     - Use JSON output format");
    println!("  /help            - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run interactive REPL mode
async fn run_interactive(service: &Service, mut format: OutputFormat) -> Result<()> {
    println!("Interactive Research Assistant");
    print_help();
    println!();

    let mut rl = DefaultEditor::new().context("Failed to create readline editor")?;

    loop {
        match rl.readline("Ask> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line).ok();

                if line.starts_with('/') {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    match parts.as_slice() {
                        ["/help"] => print_help(),
                        ["/format", name] => match OutputFormat::from_str(name, true) {
                            Ok(f) => {
                                format = f;
                                println!("Set output format to {}", name);
                            }
                            Err(_) => eprintln!("Invalid format: must be markdown, table or json"),
                        },
                        _ => eprintln!(
                            "Unknown command: {}. Type /help for available commands.",
                            parts[0]
                        ),
                    }
                    continue;
                }

                let start = Instant::now();
                match service.handle(&AnswerRequest::new(line)).await {
                    Ok(response) => {
                        print_response(&response, format)?;
                        println!("\nAnswered in {:.2}s", start.elapsed().as_secs_f64());
                    }
                    Err(e) => eprintln!("{}", e.error),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let service = build_service(&args).await?;

    if args.interactive {
        run_interactive(&service, args.format).await
    } else {
        run_single_question(&service, args.question.clone(), args.format).await
    }
}
