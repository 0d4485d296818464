use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DocumentConfig;
use crate::document::{Chunk, DocumentParser, TextChunker};

use super::traits::{EmbeddingProvider, RetrievedChunk, Retriever};
use super::vector_store::VectorIndex;

/// The indexed source document. Built once at startup, read-only afterwards.
pub struct DocumentStore {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl DocumentStore {
    /// Load -> split -> embed -> index
    pub async fn build(
        config: &DocumentConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Result<Self> {
        let path = PathBuf::from(&config.path);
        info!("Loading source document {:?}", path);

        let parsed = tokio::task::spawn_blocking(move || DocumentParser::parse(&path))
            .await
            .context("Document parser task failed")??;
        info!(
            "Parsed {} pages ({} chars, {})",
            parsed.metadata.pages, parsed.metadata.char_count, parsed.metadata.file_type
        );

        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;
        let chunks = chunker.chunk_pages(&parsed.pages);
        if chunks.is_empty() {
            bail!("No text content found in {}", config.path);
        }
        info!("Created {} chunks", chunks.len());

        Self::from_chunks(chunks, embedder, top_k).await
    }

    pub async fn from_chunks(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Result<Self> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let embedding = embedder
                .embed(&chunk.content)
                .await
                .with_context(|| format!("Failed to embed chunk {}", i))?;
            embeddings.push(embedding);
        }
        debug!("Generated {} embeddings", embeddings.len());

        let index = VectorIndex::new(chunks, embeddings);
        info!("✅ Document index ready with {} chunks", index.len());

        Ok(Self {
            index,
            embedder,
            top_k,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[async_trait]
impl Retriever for DocumentStore {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let chunks = self.index.search(&query_embedding, self.top_k);
        debug!("Retrieved {} chunks", chunks.len());
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::traits::MockEmbeddingProvider;

    /// Two-dimensional bag of words: "needle" vs "bobbin"
    fn keyword_embedder() -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().returning(|text| {
            let text = text.to_lowercase();
            Ok(vec![
                text.matches("needle").count() as f32,
                text.matches("bobbin").count() as f32,
            ])
        });
        embedder
    }

    fn chunk(content: &str, page_number: u32) -> Chunk {
        Chunk {
            content: content.to_string(),
            page_number,
            start_pos: 0,
        }
    }

    #[tokio::test]
    async fn test_retrieve_most_similar_chunks() {
        let store = DocumentStore::from_chunks(
            vec![
                chunk("Insert the needle with the flat side back.", 2),
                chunk("Wind the bobbin before threading.", 5),
            ],
            Arc::new(keyword_embedder()),
            1,
        )
        .await
        .unwrap();

        assert_eq!(store.chunk_count(), 2);

        let results = store.retrieve("How do I change the bobbin?").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].page_number, 5);
        assert!(results[0].content.contains("bobbin"));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_build() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let result =
            DocumentStore::from_chunks(vec![chunk("text", 1)], Arc::new(embedder), 4).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_from_missing_file_fails() {
        let config = DocumentConfig {
            path: "./missing/manual.pdf".to_string(),
            ..DocumentConfig::default()
        };
        let result = DocumentStore::build(&config, Arc::new(keyword_embedder()), 4).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_from_pdf() {
        let bytes = crate::document::parser::tests::build_pdf(&[
            "Insert the needle with the flat side back.",
            "Wind the bobbin before threading.",
        ]);
        let path = std::env::temp_dir().join(format!("rag-chat-server-{}.pdf", std::process::id()));
        std::fs::write(&path, bytes).unwrap();

        let config = DocumentConfig {
            path: path.to_string_lossy().to_string(),
            ..DocumentConfig::default()
        };
        let store = DocumentStore::build(&config, Arc::new(keyword_embedder()), 1)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.chunk_count(), 2);
        let results = store.retrieve("needle size").await.unwrap();
        assert_eq!(results[0].page_number, 1);
    }
}
