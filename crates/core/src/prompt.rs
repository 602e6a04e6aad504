use crate::error::RagError;
use crate::models::Chunk;
use regex::{Captures, Regex};

pub const DEFAULT_TEMPLATE: &str = "\
Using ONLY the context below, answer the question.
If you don't know the answer, just say you don't know. DO NOT try to make up an answer.

Context:
{context}

Question:
{question}
";

pub const CONTEXT_DELIMITER: &str = "\n\n";

const PLACEHOLDER_PATTERN: &str = r"\{(context|question)\}";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    placeholders: Regex,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, RagError> {
        let text = text.into();
        let placeholders = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|error| RagError::Configuration(error.to_string()))?;

        for name in ["context", "question"] {
            let count = placeholders
                .captures_iter(&text)
                .filter(|capture| &capture[1] == name)
                .count();
            if count != 1 {
                return Err(RagError::Configuration(format!(
                    "prompt template must contain {{{name}}} exactly once, found {count}"
                )));
            }
        }

        Ok(Self { text, placeholders })
    }

    pub fn standard() -> Result<Self, RagError> {
        Self::new(DEFAULT_TEMPLATE)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn assemble(&self, context_chunks: &[Chunk], question: &str) -> String {
        let context = context_chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        self.placeholders
            .replace_all(&self.text, |capture: &Captures| match &capture[1] {
                "context" => context.as_str(),
                _ => question,
            })
            .into_owned()
    }
}
