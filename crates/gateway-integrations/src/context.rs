//! Retrieved context passages.

use crate::error::IntegrationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One retrieved passage, optionally with a citable reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPassage {
    /// Passage text
    pub content: String,
    /// Bibliographic reference, e.g. `Title, Authors, arXiv:2401.00001, 2024-01-01`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ContextPassage {
    /// Create an uncited passage
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reference: None,
        }
    }

    /// Attach a reference
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Source of passages relevant to a query
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Passages relevant to `query`, most relevant first
    async fn retrieve(&self, query: &str) -> IntegrationResult<Vec<ContextPassage>>;
}

/// Fixed passages returned for every query
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    passages: Vec<ContextPassage>,
}

impl StaticContext {
    /// Create from passages
    #[must_use]
    pub fn new(passages: Vec<ContextPassage>) -> Self {
        Self { passages }
    }

    /// Create from plain text blocks
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ContextPassage::new).collect())
    }
}

#[async_trait]
impl ContextSource for StaticContext {
    async fn retrieve(&self, _query: &str) -> IntegrationResult<Vec<ContextPassage>> {
        Ok(self.passages.clone())
    }
}
