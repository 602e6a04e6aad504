use crate::error::RagError;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let mut hash = 1469598103934665603u64;
            for ch in window {
                let mut buffer = [0u8; 4];
                for byte in ch.encode_utf8(&mut buffer).bytes() {
                    hash ^= byte as u64;
                    hash = hash.wrapping_mul(1099511628211);
                }
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed_text(text))
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddings {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Configuration(
                "missing API key for the embedding provider".to_string(),
            ));
        }
        if model.trim().is_empty() {
            return Err(RagError::Configuration(
                "missing embedding model name".to_string(),
            ));
        }
        if dimensions == 0 {
            return Err(RagError::Configuration(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        let endpoint = endpoint_url(base_url, "embeddings")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RagError::Configuration(format!("http client: {error}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|error| RagError::Embedding(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Embedding(format!(
                "{} returned {status}: {body}",
                self.endpoint
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| RagError::Embedding(format!("invalid response: {error}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| RagError::Embedding("response contained no embedding".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(RagError::Embedding(format!(
                "model {} returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }
}

pub(crate) fn endpoint_url(base_url: &str, path: &str) -> Result<Url, RagError> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .map_err(|error| RagError::Configuration(format!("invalid base url {base_url}: {error}")))?;
    base.join(path)
        .map_err(|error| RagError::Configuration(format!("invalid endpoint {path}: {error}")))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedder_is_deterministic() {
        let embedder = CharacterNgramEmbedder::default();
        let first = embedder.embed("The brim of his soft felt hat").await.unwrap();
        let second = embedder.embed("The brim of his soft felt hat").await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn embedder_outputs_expected_length_and_unit_norm() {
        let embedder = CharacterNgramEmbedder { dimensions: 32 };
        let vector = embedder.embed_text("invisible");
        assert_eq!(vector.len(), 32);

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn short_text_embeds_to_zero_vector() {
        let embedder = CharacterNgramEmbedder { dimensions: 8 };
        assert!(embedder.embed_text("ab").iter().all(|value| *value == 0.0));
    }

    #[test]
    fn endpoint_keeps_version_prefix() {
        let url = endpoint_url("https://api.openai.com/v1/", "embeddings").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/embeddings");

        let url = endpoint_url("http://localhost:8000/v1", "chat/completions").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn openai_embeddings_require_an_api_key() {
        let error = OpenAiEmbeddings::new(
            " ",
            "https://api.openai.com/v1",
            "text-embedding-3-small",
            384,
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(error, RagError::Configuration(_)));
    }
}
