use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pdf_qa_core::{
    ingest_document, prepare_prompt, source_for_path, AnswerCoordinator, AnthropicChat,
    Answer, CharacterNgramEmbedder, EmbeddingProvider, GenerationService, GenerationSettings,
    OpenAiChat, OpenAiEmbeddings, PromptTemplate, QueryResult, RagError, RagOptions, Retriever,
    VectorIndex, DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const NO_CONTEXT_MESSAGE: &str = "could not answer: no relevant context found";

#[derive(Parser)]
#[command(name = "pdf-qa", version, about = "Index one document and answer questions about it")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Index file
    #[arg(long, global = true, env = "PDF_QA_INDEX", default_value = "pdf_qa_index.jsonl")]
    index: PathBuf,

    /// Embedding backend
    #[arg(long, global = true, env = "PDF_QA_EMBEDDER", value_enum, default_value_t = EmbedderKind::Ngram)]
    embedder: EmbedderKind,

    /// Embedding model for the OpenAI backend
    #[arg(
        long,
        global = true,
        env = "PDF_QA_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    embedding_model: String,

    /// Vector length produced by the embedder
    #[arg(long, global = true, env = "PDF_QA_EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// OpenAI-compatible API base URL
    #[arg(
        long,
        global = true,
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    openai_base_url: String,

    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Request timeout for provider calls
    #[arg(long, global = true, env = "PDF_QA_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Build a fresh index from one PDF or text document.
    Ingest {
        /// PDF or plain text file.
        document: PathBuf,
        /// Maximum chunk length in characters.
        #[arg(long, env = "PDF_QA_CHUNK_SIZE", default_value_t = 1000)]
        chunk_size: usize,
        /// Characters shared by consecutive chunks.
        #[arg(long, env = "PDF_QA_CHUNK_OVERLAP", default_value_t = 200)]
        chunk_overlap: usize,
    },
    /// Answer a question from the indexed document.
    Ask {
        question: String,
        /// Number of chunks passed to the model.
        #[arg(long, env = "PDF_QA_TOP_K", default_value_t = 3)]
        top_k: usize,
        /// Print the assembled prompt instead of calling the model.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Print the retrieved chunks after the answer.
        #[arg(long, default_value_t = false)]
        show_sources: bool,
        /// Answering model provider
        #[arg(long, env = "PDF_QA_LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Openai)]
        llm_provider: LlmProvider,
        /// OpenAI chat model
        #[arg(long, env = "PDF_QA_OPENAI_MODEL", default_value = "gpt-4o-mini")]
        openai_model: String,
        /// Anthropic API key (required with --llm-provider anthropic)
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        anthropic_api_key: Option<String>,
        /// Anthropic model
        #[arg(
            long,
            env = "PDF_QA_ANTHROPIC_MODEL",
            default_value = "claude-3-5-haiku-latest"
        )]
        anthropic_model: String,
        /// Anthropic API base URL
        #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = AnthropicChat::DEFAULT_BASE_URL)]
        anthropic_base_url: String,
        /// Sampling temperature
        #[arg(long, default_value_t = 0.2)]
        temperature: f32,
        /// Maximum tokens in the answer
        #[arg(long, default_value_t = 512)]
        max_tokens: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmbedderKind {
    /// Offline hashed character trigrams
    Ngram,
    Openai,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LlmProvider {
    Openai,
    Anthropic,
}

enum Outcome {
    Done,
    NoContext,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    match run(cli).await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NoContext) => {
            eprintln!("{NO_CONTEXT_MESSAGE}");
            ExitCode::from(2)
        }
        Err(error) => {
            match error.downcast_ref::<RagError>() {
                Some(rag) => eprintln!("error[{}]: {rag}", rag.kind()),
                None => eprintln!("error: {error:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let embedder = build_embedder(&cli)?;

    match cli.command {
        Command::Ingest {
            ref document,
            chunk_size,
            chunk_overlap,
        } => {
            let options = RagOptions {
                chunk_size,
                chunk_overlap,
                index_path: cli.index.clone(),
                ..RagOptions::default()
            };
            options.validate()?;

            // Built in memory so a failed run leaves the previous index file alone.
            let mut index = VectorIndex::new();
            let source = source_for_path(document);
            let report =
                ingest_document(document, source.as_ref(), embedder.as_ref(), &options, &mut index)
                    .await?;
            index.persist_to(&options.index_path)?;

            println!(
                "{} pages, {} chunks ({} dims) indexed into {} at {}",
                report.pages,
                report.chunks,
                report.dimension,
                options.index_path.display(),
                Utc::now().to_rfc3339()
            );
            Ok(Outcome::Done)
        }
        Command::Ask {
            ref question,
            top_k,
            dry_run,
            show_sources,
            llm_provider,
            ref openai_model,
            ref anthropic_api_key,
            ref anthropic_model,
            ref anthropic_base_url,
            temperature,
            max_tokens,
        } => {
            let options = ask_options(cli.index.clone(), top_k)?;
            let index = Arc::new(VectorIndex::load(&options.index_path)?);
            let retriever = Retriever::new(index, embedder, options.top_k)?;
            let template = PromptTemplate::new(options.prompt_template.as_str())?;

            if dry_run {
                let Some(prepared) = prepare_prompt(&retriever, &template, question).await? else {
                    return Ok(Outcome::NoContext);
                };
                println!("{}", prepared.prompt);
                if show_sources {
                    print_sources(&prepared.sources);
                }
                return Ok(Outcome::Done);
            }

            let settings = GenerationSettings {
                temperature,
                max_tokens,
                timeout: Duration::from_secs(cli.timeout_secs),
            };
            let generator: Box<dyn GenerationService> = match llm_provider {
                LlmProvider::Openai => Box::new(OpenAiChat::new(
                    cli.openai_api_key.clone().unwrap_or_default(),
                    &cli.openai_base_url,
                    openai_model.as_str(),
                    settings,
                )?),
                LlmProvider::Anthropic => Box::new(AnthropicChat::new(
                    anthropic_api_key.clone().unwrap_or_default(),
                    anthropic_base_url,
                    anthropic_model.as_str(),
                    settings,
                )?),
            };

            let coordinator = AnswerCoordinator::new(retriever, template, generator);
            match coordinator.answer(question).await? {
                Answer::Answered { text, sources } => {
                    println!("{}", text.trim());
                    if show_sources {
                        print_sources(&sources);
                    }
                    Ok(Outcome::Done)
                }
                Answer::NoContext => Ok(Outcome::NoContext),
            }
        }
    }
}

fn ask_options(index_path: PathBuf, top_k: usize) -> Result<RagOptions, RagError> {
    let options = RagOptions {
        top_k,
        index_path,
        ..RagOptions::default()
    };
    options.validate()?;
    Ok(options)
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    let embedder: Box<dyn EmbeddingProvider> = match cli.embedder {
        EmbedderKind::Ngram => Box::new(CharacterNgramEmbedder {
            dimensions: cli.embedding_dimensions,
        }),
        EmbedderKind::Openai => Box::new(OpenAiEmbeddings::new(
            cli.openai_api_key.clone().unwrap_or_default(),
            &cli.openai_base_url,
            cli.embedding_model.as_str(),
            cli.embedding_dimensions,
            Duration::from_secs(cli.timeout_secs),
        )?),
    };
    Ok(embedder)
}

fn print_sources(sources: &[QueryResult]) {
    println!();
    for (rank, hit) in sources.iter().enumerate() {
        println!(
            "[{}] distance={:.4} page={} offset={} chunk={}",
            rank + 1,
            hit.score,
            hit.chunk.page_number,
            hit.chunk.start_offset,
            hit.chunk.chunk_id
        );
        println!("{}", hit.chunk.text.trim());
    }
}
