//! Seam to the retrieval collaborator.
//!
//! The gateway hands the final user query to a [`PromptBuilder`] and sends
//! whatever it returns as the user turn. Retrieval, embedding and indexing
//! live entirely behind this trait.

use crate::error::GatewayResult;
use async_trait::async_trait;

/// Builds the augmented user-turn content for a query
#[async_trait]
pub trait PromptBuilder: Send + Sync {
    /// Produce the user-turn content for `query`.
    ///
    /// Failures are reported as [`crate::GatewayError::Prompt`].
    async fn build_prompt(&self, query: &str) -> GatewayResult<String>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Returns the query unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPromptBuilder;

#[async_trait]
impl PromptBuilder for StaticPromptBuilder {
    async fn build_prompt(&self, query: &str) -> GatewayResult<String> {
        Ok(query.to_string())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_builder_passes_query_through() {
        let prompt = StaticPromptBuilder.build_prompt("what is RAG?").await.unwrap();
        assert_eq!(prompt, "what is RAG?");
    }
}
