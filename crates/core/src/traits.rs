use crate::error::RagError;
use crate::models::Page;
use async_trait::async_trait;
use std::path::Path;

pub trait DocumentSource {
    fn load(&self, path: &Path, document_id: &str) -> Result<Vec<Page>, RagError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

#[async_trait]
impl<T> EmbeddingProvider for Box<T>
where
    T: EmbeddingProvider + ?Sized,
{
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<T> GenerationService for Box<T>
where
    T: GenerationService + ?Sized,
{
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        (**self).complete(prompt).await
    }
}
