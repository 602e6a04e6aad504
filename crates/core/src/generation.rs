use crate::embeddings::endpoint_url;
use crate::error::RagError;
use crate::traits::GenerationService;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 512,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    settings: GenerationSettings,
}

impl OpenAiChat {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Result<Self, RagError> {
        let api_key = require("OpenAI API key", api_key.into())?;
        let model = require("chat model name", model.into())?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            endpoint: endpoint_url(base_url, "chat/completions")?,
            api_key,
            model,
            settings,
        })
    }
}

#[async_trait]
impl GenerationService for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|error| RagError::Generation(error.to_string()))?;
        let response = ensure_success(response, &self.endpoint).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| RagError::Generation(format!("invalid response: {error}")))?;
        parsed.into_answer()
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicChat {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    settings: GenerationSettings,
}

impl AnthropicChat {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com/v1";

    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Result<Self, RagError> {
        let api_key = require("Anthropic API key", api_key.into())?;
        let model = require("chat model name", model.into())?;
        Ok(Self {
            client: build_client(settings.timeout)?,
            endpoint: endpoint_url(base_url, "messages")?,
            api_key,
            model,
            settings,
        })
    }
}

#[async_trait]
impl GenerationService for AnthropicChat {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", self.api_key.trim())
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|error| RagError::Generation(error.to_string()))?;
        let response = ensure_success(response, &self.endpoint).await?;

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|error| RagError::Generation(format!("invalid response: {error}")))?;
        parsed.into_answer()
    }
}

fn require(what: &str, value: String) -> Result<String, RagError> {
    if value.trim().is_empty() {
        Err(RagError::Configuration(format!("missing {what}")))
    } else {
        Ok(value)
    }
}

fn build_client(timeout: Duration) -> Result<Client, RagError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| RagError::Configuration(format!("http client: {error}")))
}

async fn ensure_success(response: Response, endpoint: &Url) -> Result<Response, RagError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(RagError::Generation(format!(
        "{endpoint} returned {status}: {body}"
    )))
}

fn non_empty(answer: String) -> Result<String, RagError> {
    if answer.trim().is_empty() {
        Err(RagError::Generation(
            "response contained no answer text".to_string(),
        ))
    } else {
        Ok(answer)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatResponse {
    fn into_answer(self) -> Result<String, RagError> {
        let answer = self
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default();
        non_empty(answer)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicContentBlock<'a>>,
}

#[derive(Serialize)]
struct AnthropicContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

impl AnthropicResponse {
    fn into_answer(self) -> Result<String, RagError> {
        let answer = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text),
                AnthropicResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        non_empty(answer)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
