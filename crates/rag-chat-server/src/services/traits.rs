//! Seams to the external capabilities: embedding, retrieval and generation.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::chat::ChatMessage;

/// Text-embedding capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Text-generation capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Similarity search over the indexed document
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk_id: usize,
    pub page_number: u32,
    pub content: String,
    pub similarity: f32,
}
