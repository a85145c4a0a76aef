//! Citation-aware instruction prompt.
//!
//! The prompt is the retrieved passages separated by blank lines, followed
//! by a `[Question]` section with the user query and an `[Instructions]`
//! section telling the model to stay within the context and cite passage
//! numbers. Cited passages are numbered from 1 in retrieval order:
//!
//! ```text
//! [1] <content>
//! [Reference 1]: <reference>
//!
//! <uncited content>
//!
//! [Question]
//! <query>
//!
//! [Instructions]
//! Answer the question based on the provided context. ...
//! ```

use crate::context::{ContextPassage, ContextSource};
use async_trait::async_trait;
use gateway_core::{GatewayResult, PromptBuilder};
use std::sync::Arc;
use tracing::debug;

/// Closing instructions appended to every prompt
pub const ANSWER_INSTRUCTIONS: &str = "Answer the question based on the provided context. \
If you use information from a specific passage, cite its number (e.g., [1]). \
Do not include any information not present in the context.";

/// Builds instruction prompts around passages from a [`ContextSource`]
#[derive(Clone)]
pub struct InstructionPromptBuilder {
    source: Arc<dyn ContextSource>,
}

impl InstructionPromptBuilder {
    /// Create a builder over a context source
    pub fn new(source: Arc<dyn ContextSource>) -> Self {
        Self { source }
    }

    /// Assemble the prompt from already retrieved passages
    #[must_use]
    pub fn render(passages: &[ContextPassage], query: &str) -> String {
        let blocks: Vec<String> = passages
            .iter()
            .enumerate()
            .map(|(i, passage)| render_block(i + 1, passage))
            .collect();

        let mut prompt = blocks.join("\n\n");
        prompt.push_str("\n\n[Question]\n");
        prompt.push_str(query);
        prompt.push_str("\n\n[Instructions]\n");
        prompt.push_str(ANSWER_INSTRUCTIONS);
        prompt
    }
}

fn render_block(number: usize, passage: &ContextPassage) -> String {
    match &passage.reference {
        Some(reference) => format!(
            "[{number}] {}\n[Reference {number}]: {reference}",
            passage.content
        ),
        None => passage.content.clone(),
    }
}

impl std::fmt::Debug for InstructionPromptBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionPromptBuilder").finish_non_exhaustive()
    }
}

#[async_trait]
impl PromptBuilder for InstructionPromptBuilder {
    async fn build_prompt(&self, query: &str) -> GatewayResult<String> {
        let passages = self.source.retrieve(query).await?;
        debug!(passages = passages.len(), "Retrieved context");
        Ok(Self::render(&passages, query))
    }

    fn name(&self) -> &str {
        "instruction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use crate::error::{IntegrationError, IntegrationResult};

    struct FailingSource;

    #[async_trait]
    impl ContextSource for FailingSource {
        async fn retrieve(&self, _query: &str) -> IntegrationResult<Vec<ContextPassage>> {
            Err(IntegrationError::Connection("index offline".into()))
        }
    }

    #[test]
    fn test_render_without_context() {
        let prompt = InstructionPromptBuilder::render(&[], "What is RAG?");
        assert_eq!(
            prompt,
            format!("\n\n[Question]\nWhat is RAG?\n\n[Instructions]\n{ANSWER_INSTRUCTIONS}")
        );
    }

    #[test]
    fn test_render_numbers_cited_passages() {
        let passages = vec![
            ContextPassage::new("Transformers use attention.")
                .with_reference("Attention Is All You Need, Vaswani et al., arXiv:1706.03762, 2017-06-12"),
            ContextPassage::new("Chapter 2 covers thesis formatting."),
        ];

        let prompt = InstructionPromptBuilder::render(&passages, "What do transformers use?");

        assert!(prompt.starts_with(
            "[1] Transformers use attention.\n[Reference 1]: Attention Is All You Need, Vaswani et al., arXiv:1706.03762, 2017-06-12\n\nChapter 2 covers thesis formatting.\n\n[Question]\nWhat do transformers use?\n\n[Instructions]\n"
        ));
        assert!(prompt.ends_with("Do not include any information not present in the context."));
    }

    #[tokio::test]
    async fn test_build_prompt_with_static_context() {
        let builder = InstructionPromptBuilder::new(Arc::new(StaticContext::from_texts(["Alpha", "Beta"])));

        let prompt = builder.build_prompt("Which letters?").await.unwrap();

        assert!(prompt.starts_with("Alpha\n\nBeta\n\n[Question]\nWhich letters?"));
        assert_eq!(builder.name(), "instruction");
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_prompt_error() {
        let builder = InstructionPromptBuilder::new(Arc::new(FailingSource));

        let err = builder.build_prompt("q").await.unwrap_err();
        assert!(matches!(err, gateway_core::GatewayError::Prompt { .. }));
    }
}
