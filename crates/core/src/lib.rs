pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod traits;

pub use chunking::{split, split_page, split_pages, ChunkingConfig, DEFAULT_SEPARATORS};
pub use embeddings::{CharacterNgramEmbedder, OpenAiEmbeddings, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{RagError, Result};
pub use extractor::{source_for_path, PdfSource, TextFileSource};
pub use generation::{AnthropicChat, GenerationSettings, OpenAiChat};
pub use index::VectorIndex;
pub use ingest::{digest_file, generate_document_id, ingest_document, IngestionReport};
pub use models::{Chunk, IndexEntry, Page, QueryResult, RagOptions};
pub use orchestrator::{prepare_prompt, Answer, AnswerCoordinator, PreparedPrompt};
pub use prompt::{PromptTemplate, DEFAULT_TEMPLATE};
pub use retriever::Retriever;
pub use traits::{DocumentSource, EmbeddingProvider, GenerationService};
