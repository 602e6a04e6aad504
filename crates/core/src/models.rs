use crate::chunking::DEFAULT_SEPARATORS;
use crate::error::RagError;
use crate::prompt::DEFAULT_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub document_id: String,
    pub page_number: u32,
    pub text: String,
}

/// A bounded span of page text. `start_offset` counts characters from the
/// start of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: String,
    pub page_number: u32,
    pub start_offset: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl Chunk {
    pub fn into_entry(self, vector: Vec<f32>) -> IndexEntry {
        IndexEntry::new(self, vector)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(mut chunk: Chunk, vector: Vec<f32>) -> Self {
        chunk.vector = Some(vector.clone());
        Self { chunk, vector }
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk.chunk_id
    }
}

/// A ranked hit. `score` is the cosine distance to the query vector, so lower
/// is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct RagOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub index_path: PathBuf,
    pub separators: Vec<String>,
    pub prompt_template: String,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 200,
            top_k: 3,
            index_path: PathBuf::from("pdf_qa_index.jsonl"),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            prompt_template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl RagOptions {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Configuration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.separators.is_empty() {
            return Err(RagError::Configuration(
                "separator list must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
