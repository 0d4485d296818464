use anyhow::{Context, Result};
use text_splitter::{ChunkConfig, TextSplitter};

use super::parser::PageText;

#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub page_number: u32,
    /// Byte offset of the chunk inside its page text
    pub start_pos: usize,
}

/// Recursive splitter: paragraphs, then lines, sentences, words and finally
/// characters, so chunks break on the largest boundary that still fits.
/// Size and overlap are measured in characters.
pub struct TextChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .context("Invalid chunk configuration")?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn chunk(&self, text: &str, page_number: u32) -> Vec<Chunk> {
        self.splitter
            .chunk_indices(text)
            .map(|(start_pos, content)| Chunk {
                content: content.to_string(),
                page_number,
                start_pos,
            })
            .collect()
    }

    /// Pages are split independently so a chunk never spans two pages
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| self.chunk(&page.text, page.page_number))
            .collect()
    }
}
