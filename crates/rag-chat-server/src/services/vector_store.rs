use std::cmp::Ordering;

use crate::document::Chunk;

use super::traits::RetrievedChunk;

/// Cosine similarity in [-1, 1]. `None` on dimension mismatch or empty input;
/// a zero vector scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Brute-force in-memory vector index. Built once, read-only afterwards.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` chunks by descending similarity; ties keep index order
    pub fn search(&self, query: &[f32], k: usize) -> Vec<RetrievedChunk> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| cosine_similarity(query, &entry.embedding).map(|s| (id, s)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(id, similarity)| {
                let chunk = &self.entries[id].chunk;
                RetrievedChunk {
                    chunk_id: id,
                    page_number: chunk.page_number,
                    content: chunk.content.clone(),
                    similarity,
                }
            })
            .collect()
    }
}
