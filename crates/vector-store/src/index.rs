use crate::embeddings::{check_dimensions, cosine_similarity, EmbeddingProvider};
use crate::error::{Result, VectorStoreError};
use crate::fingerprint::ContentFingerprint;
use crate::types::{ScoredChunk, StoredChunk};
use marketlens_chunker::Chunk;
use serde::{Deserialize, Serialize};

/// Texts sent to the provider per call.
const EMBED_BATCH: usize = 64;

/// Brute-force cosine index over one chunked document set.
///
/// Immutable once built; safe to share behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityIndex {
    fingerprint: ContentFingerprint,
    model_id: String,
    dimension: usize,
    entries: Vec<StoredChunk>,
}

impl SimilarityIndex {
    /// Embed every chunk. Any provider failure aborts the whole build; there is no partial
    /// index.
    pub async fn build(
        fingerprint: ContentFingerprint,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let dimension = embedder.dimension();
        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(VectorStoreError::embedding(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            check_dimensions(&vectors, dimension)?;
            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(chunk, vector)| StoredChunk { chunk, vector }),
            );
        }

        log::info!(
            "built index {} with {} chunks ({})",
            fingerprint.short(),
            entries.len(),
            embedder.model_id()
        );
        Ok(Self {
            fingerprint,
            model_id: embedder.model_id().to_string(),
            dimension,
            entries,
        })
    }

    /// Top `k` chunks by cosine similarity to `text`, best first. Equal scores are ordered by
    /// ascending `sequence_index`, so repeated queries return identical results.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = embedder.embed(text).await?;
        self.search(&vector, k)
    }

    /// [`Self::query`], refusing an index built for different content.
    pub async fn query_checked(
        &self,
        expected: &ContentFingerprint,
        text: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>> {
        if &self.fingerprint != expected {
            return Err(VectorStoreError::StaleIndex {
                expected: expected.to_string(),
                actual: self.fingerprint.to_string(),
            });
        }
        self.query(text, k, embedder).await
    }

    /// Search with a precomputed query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, &StoredChunk)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.chunk.sequence_index.cmp(&b.1.chunk.sequence_index))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    #[must_use]
    pub const fn fingerprint(&self) -> &ContentFingerprint {
        &self.fingerprint
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunks in index order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }

    /// Every vector matches the declared dimension.
    pub(crate) fn is_consistent(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.vector.len() == self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::StubEmbedder;
    use async_trait::async_trait;
    use marketlens_chunker::ChunkerConfig;

    fn chunk(idx: usize, text: &str) -> Chunk {
        Chunk {
            source_label: "doc".to_string(),
            sequence_index: idx,
            text: text.to_string(),
            char_start: 0,
            char_end: text.chars().count(),
        }
    }

    fn fingerprint(tag: &str) -> ContentFingerprint {
        ContentFingerprint::of(&[(tag, tag)], &ChunkerConfig::default(), "stub-16")
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_id(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(VectorStoreError::embedding("quota exceeded"))
        }
    }

    #[tokio::test]
    async fn exact_text_ranks_first() {
        let embedder = StubEmbedder::new(16);
        let chunks: Vec<Chunk> = (0..6)
            .map(|i| chunk(i, &format!("paragraph number {i} about margins")))
            .collect();
        let index = SimilarityIndex::build(fingerprint("a"), chunks, &embedder)
            .await
            .unwrap();

        let hits = index
            .query("paragraph number 3 about margins", 3, &embedder)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.sequence_index, 3);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

        let again = index
            .query("paragraph number 3 about margins", 3, &embedder)
            .await
            .unwrap();
        assert_eq!(hits, again);
    }

    #[tokio::test]
    async fn ties_break_by_sequence_index() {
        let embedder = StubEmbedder::new(16);
        let chunks = vec![chunk(2, "same"), chunk(0, "same"), chunk(1, "same")];
        let index = SimilarityIndex::build(fingerprint("t"), chunks, &embedder)
            .await
            .unwrap();
        let hits = index.query("same", 10, &embedder).await.unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk.sequence_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let embedder = StubEmbedder::new(16);
        let index = SimilarityIndex::build(fingerprint("e"), Vec::new(), &embedder)
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(index.query("anything", 5, &embedder).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_aborts_build() {
        let err = SimilarityIndex::build(fingerprint("f"), vec![chunk(0, "x")], &FailingEmbedder)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingError(_)));
    }

    #[tokio::test]
    async fn checked_query_rejects_other_fingerprint() {
        let embedder = StubEmbedder::new(16);
        let index = SimilarityIndex::build(fingerprint("a"), vec![chunk(0, "x")], &embedder)
            .await
            .unwrap();
        let err = index
            .query_checked(&fingerprint("b"), "x", 1, &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::StaleIndex { .. }));
        assert_eq!(
            index
                .query_checked(&fingerprint("a"), "x", 1, &embedder)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let index = SimilarityIndex {
            fingerprint: fingerprint("d"),
            model_id: "m".to_string(),
            dimension: 3,
            entries: vec![StoredChunk {
                chunk: chunk(0, "x"),
                vector: vec![1.0, 0.0, 0.0],
            }],
        };
        assert!(index.search(&[1.0, 0.0], 1).is_err());
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 1).unwrap().len(), 1);
    }
}
