use crate::chunking::{split_pages, ChunkingConfig};
use crate::error::RagError;
use crate::index::VectorIndex;
use crate::models::RagOptions;
use crate::traits::{DocumentSource, EmbeddingProvider};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub document_id: String,
    pub checksum: String,
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub index_path: Option<PathBuf>,
}

pub fn digest_file(path: &Path) -> Result<String, RagError> {
    let bytes = fs::read(path).map_err(|error| match error.kind() {
        std::io::ErrorKind::NotFound => RagError::DocumentNotFound(path.display().to_string()),
        _ => RagError::DocumentParse(format!("{}: {error}", path.display())),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The first embedding failure aborts the run before anything reaches the index.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn ingest_document<E>(
    path: &Path,
    source: &dyn DocumentSource,
    embedder: &E,
    options: &RagOptions,
    index: &mut VectorIndex,
) -> Result<IngestionReport, RagError>
where
    E: EmbeddingProvider + ?Sized,
{
    options.validate()?;
    let config = ChunkingConfig::try_from(options)?;

    if !path.is_file() {
        return Err(RagError::DocumentNotFound(path.display().to_string()));
    }

    let document_id = generate_document_id(path);
    let checksum = digest_file(path)?;
    let pages = source.load(path, &document_id)?;

    let blank_pages = pages
        .iter()
        .filter(|page| page.text.trim().is_empty())
        .count();
    if blank_pages == pages.len() {
        return Err(RagError::DocumentParse(format!(
            "no readable text in {}",
            path.display()
        )));
    }
    if blank_pages > 0 {
        warn!(blank_pages, "pages without extractable text were skipped");
    }

    let chunks = split_pages(&pages, &config)?;
    info!(
        pages = pages.len(),
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "document chunked"
    );

    let mut entries = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let vector = embedder.embed(&chunk.text).await?;
        entries.push(chunk.into_entry(vector));
    }

    let chunk_count = entries.len();
    index.upsert(entries)?;

    let report = IngestionReport {
        document_id,
        checksum,
        pages: pages.len(),
        chunks: chunk_count,
        dimension: index.dimension().unwrap_or(embedder.dimensions()),
        index_path: index.path().map(Path::to_path_buf),
    };
    info!(
        document_id = %report.document_id,
        chunks = report.chunks,
        dimension = report.dimension,
        "document indexed"
    );
    Ok(report)
}
