use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document parse error: {0}")]
    DocumentParse(String),

    #[error("embedding provider failed: {0}")]
    Embedding(String),

    #[error("index write failed: {0}")]
    IndexWrite(String),

    #[error("index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index holds no entries")]
    EmptyIndex,

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] Box<RagError>),

    #[error("generation service failed: {0}")]
    Generation(String),
}

impl RagError {
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::Configuration(_) => "ConfigurationError",
            RagError::DocumentNotFound(_) => "DocumentNotFoundError",
            RagError::DocumentParse(_) => "DocumentParseError",
            RagError::Embedding(_) => "EmbeddingError",
            RagError::IndexWrite(_) => "IndexWriteError",
            RagError::IndexCorrupt(_) => "IndexCorruptError",
            RagError::DimensionMismatch { .. } => "DimensionMismatchError",
            RagError::EmptyIndex => "EmptyIndexError",
            RagError::Retrieval(_) => "RetrievalError",
            RagError::Generation(_) => "GenerationError",
        }
    }

    pub fn retrieval(cause: RagError) -> Self {
        RagError::Retrieval(Box::new(cause))
    }
}

pub type Result<T, E = RagError> = std::result::Result<T, E>;
