use crate::error::RagError;
use crate::index::VectorIndex;
use crate::models::QueryResult;
use crate::traits::EmbeddingProvider;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct Retriever<E> {
    index: Arc<VectorIndex>,
    embedder: E,
    top_k: usize,
}

impl<E> Retriever<E>
where
    E: EmbeddingProvider,
{
    pub fn new(index: Arc<VectorIndex>, embedder: E, top_k: usize) -> Result<Self, RagError> {
        if top_k == 0 {
            return Err(RagError::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(Self {
            index,
            embedder,
            top_k,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve_top(&self, question: &str) -> Result<Vec<QueryResult>, RagError> {
        self.retrieve(question, self.top_k).await
    }

    #[instrument(skip_all, fields(k = k))]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<QueryResult>, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::retrieval(RagError::Configuration(
                "question is empty".to_string(),
            )));
        }

        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(RagError::retrieval)?;

        let expected = self.index.dimension().unwrap_or(self.embedder.dimensions());
        if vector.len() != expected {
            return Err(RagError::retrieval(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }));
        }

        let results = self.index.query(&vector, k)?;
        debug!(
            hits = results.len(),
            best = results.first().map(|hit| hit.score),
            "retrieved chunks"
        );
        Ok(results)
    }
}
