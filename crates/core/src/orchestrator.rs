use crate::error::RagError;
use crate::models::{Chunk, QueryResult};
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;
use crate::traits::{EmbeddingProvider, GenerationService};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Answered {
        text: String,
        sources: Vec<QueryResult>,
    },
    NoContext,
}

#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub sources: Vec<QueryResult>,
}

pub async fn prepare_prompt<E>(
    retriever: &Retriever<E>,
    template: &PromptTemplate,
    question: &str,
) -> Result<Option<PreparedPrompt>, RagError>
where
    E: EmbeddingProvider,
{
    let sources = match retriever.retrieve_top(question).await {
        Ok(sources) => sources,
        Err(RagError::EmptyIndex) => return Ok(None),
        Err(error) => return Err(error),
    };
    if sources.is_empty() {
        return Ok(None);
    }

    let chunks = sources
        .iter()
        .map(|hit| hit.chunk.clone())
        .collect::<Vec<Chunk>>();
    let prompt = template.assemble(&chunks, question);
    Ok(Some(PreparedPrompt { prompt, sources }))
}

pub struct AnswerCoordinator<E, G> {
    retriever: Retriever<E>,
    template: PromptTemplate,
    generator: G,
}

impl<E, G> AnswerCoordinator<E, G>
where
    E: EmbeddingProvider,
    G: GenerationService,
{
    pub fn new(retriever: Retriever<E>, template: PromptTemplate, generator: G) -> Self {
        Self {
            retriever,
            template,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }

    pub async fn prepare(&self, question: &str) -> Result<Option<PreparedPrompt>, RagError> {
        prepare_prompt(&self.retriever, &self.template, question).await
    }

    #[instrument(skip_all)]
    pub async fn answer(&self, question: &str) -> Result<Answer, RagError> {
        let Some(prepared) = self.prepare(question).await? else {
            info!("no context available for question");
            return Ok(Answer::NoContext);
        };

        let text = self.generator.complete(&prepared.prompt).await?;
        info!(
            sources = prepared.sources.len(),
            answer_chars = text.chars().count(),
            "question answered"
        );
        Ok(Answer::Answered {
            text,
            sources: prepared.sources,
        })
    }
}
