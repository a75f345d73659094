//! In-memory vector index over one document's chunks.
//!
//! Built once per extraction session, queried many times, and dropped with
//! the session. Nothing is persisted and nothing is shared across sessions.

use std::sync::Arc;

use tracing::debug;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::insight::chunker::Chunk;

struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// A chunk returned from a similarity query, with its score.
#[derive(Debug)]
pub struct Retrieved<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("chunks", &self.entries.len())
            .field("dimension", &self.embedder.dimension())
            .finish_non_exhaustive()
    }
}

impl VectorIndex {
    /// Embeds every chunk once. Any backend failure aborts the build; a
    /// partially embedded index is never returned. Vectors are checked
    /// against the provider's declared dimension, so a misbehaving backend
    /// surfaces here instead of silently zeroing similarity scores.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, EmbeddingError> {
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = checked_embed(embedder.as_ref(), &chunk.text).await?;
            entries.push(IndexEntry { chunk, embedding });
        }

        debug!(chunks = entries.len(), "vector index built");

        Ok(Self { entries, embedder })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns up to `top_k` chunks ranked by descending cosine similarity
    /// to the embedded query. Ties break on original chunk order, so the
    /// ranking is stable for a deterministic embedder.
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<Retrieved<'_>>, EmbeddingError> {
        let query_embedding = checked_embed(self.embedder.as_ref(), text).await?;

        let mut scored: Vec<Retrieved<'_>> = self
            .entries
            .iter()
            .map(|entry| Retrieved {
                chunk: &entry.chunk,
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

async fn checked_embed(
    embedder: &dyn EmbeddingProvider,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = embedder.embed(text).await?;
    let expected = embedder.dimension();
    if embedding.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

/// Cosine similarity in [-1.0, 1.0]; 0.0 for mismatched or zero vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: maps known words onto fixed axes and counts
    /// how often it is called.
    struct AxisEmbedder {
        calls: AtomicUsize,
    }

    impl AxisEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0_f32; 3];
            if text.contains("python") {
                v[0] = 1.0;
            }
            if text.contains("cooking") {
                v[1] = 1.0;
            }
            if text.contains("rust") {
                v[2] = 1.0;
            }
            Ok(v)
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            start: 0,
            end: text.len(),
        }
    }

    #[tokio::test]
    async fn test_build_embeds_every_chunk_once() {
        let embedder = AxisEmbedder::new();
        let chunks = vec![chunk(0, "python"), chunk(1, "rust"), chunk(2, "cooking")];
        let index = VectorIndex::build(chunks, embedder.clone()).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let embedder = AxisEmbedder::new();
        let chunks = vec![
            chunk(0, "cooking classes"),
            chunk(1, "python and rust"),
            chunk(2, "python only"),
        ];
        let index = VectorIndex::build(chunks, embedder).await.unwrap();

        let results = index.query("python", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        // "python only" aligns perfectly; "python and rust" is diluted.
        assert_eq!(results[0].chunk.index, 2);
        assert_eq!(results[1].chunk.index, 1);
    }

    #[tokio::test]
    async fn test_query_is_deterministic() {
        let embedder = AxisEmbedder::new();
        let chunks = vec![chunk(0, "python a"), chunk(1, "rust b"), chunk(2, "python c")];
        let index = VectorIndex::build(chunks, embedder).await.unwrap();

        let first: Vec<usize> = index
            .query("python", 3)
            .await
            .unwrap()
            .iter()
            .map(|r| r.chunk.index)
            .collect();
        let second: Vec<usize> = index
            .query("python", 3)
            .await
            .unwrap()
            .iter()
            .map(|r| r.chunk.index)
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ties_break_on_chunk_order() {
        let embedder = AxisEmbedder::new();
        // Both chunks embed identically, so their scores tie exactly.
        let chunks = vec![chunk(0, "python x"), chunk(1, "python y")];
        let index = VectorIndex::build(chunks, embedder).await.unwrap();

        let results = index.query("python", 2).await.unwrap();
        assert_eq!(results[0].chunk.index, 0);
        assert_eq!(results[1].chunk.index, 1);
    }

    /// Promises 3 dimensions, delivers 2.
    struct LyingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LyingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn test_build_rejects_wrong_dimension_vectors() {
        let err = VectorIndex::build(vec![chunk(0, "python")], Arc::new(LyingEmbedder))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let embedder = AxisEmbedder::new();
        let chunks = (0..5).map(|i| chunk(i, "python")).collect();
        let index = VectorIndex::build(chunks, embedder).await.unwrap();
        assert_eq!(index.query("python", 2).await.unwrap().len(), 2);
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
