use async_trait::async_trait;
use marketlens_chunker::{Chunker, ChunkerConfig};
use marketlens_vector_store::{
    ContentFingerprint, EmbeddingProvider, IndexStore, Result, StubEmbedder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Stub vectors, counting texts embedded and pausing per batch so builds overlap.
struct CountingEmbedder {
    inner: StubEmbedder,
    texts: AtomicUsize,
    delay: Duration,
}

impl CountingEmbedder {
    fn new(delay: Duration) -> Self {
        Self {
            inner: StubEmbedder::new(16),
            texts: AtomicUsize::new(0),
            delay,
        }
    }

    fn embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

fn document(n: usize) -> String {
    (0..n)
        .map(|i| char::from(b'a' + (i * 7 % 26) as u8))
        .collect()
}

#[tokio::test]
async fn scenario_chunk_three_is_found_by_its_own_text() {
    let config = ChunkerConfig::new(1000, 100);
    let docs = [("report", document(4600))];
    let chunks = Chunker::new(config).unwrap().chunk_documents(&docs);
    assert_eq!(chunks.len(), 5);

    let tmp = TempDir::new().unwrap();
    let store = IndexStore::new(tmp.path());
    let embedder = Arc::new(StubEmbedder::new(16));
    let fp = ContentFingerprint::of(&docs, &config, embedder.model_id());
    let index = store
        .build_or_load(fp, chunks.clone(), embedder.clone())
        .await
        .unwrap();

    let hits = index.query(&chunks[3].text, 3, embedder.as_ref()).await.unwrap();
    assert_eq!(hits[0].chunk.sequence_index, 3);
}

#[tokio::test]
async fn second_call_reuses_persisted_index() {
    let config = ChunkerConfig::default();
    let docs = [("a", document(2500))];
    let chunks = Chunker::new(config).unwrap().chunk_documents(&docs);
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let fp = ContentFingerprint::of(&docs, &config, embedder.model_id());

    let tmp = TempDir::new().unwrap();
    let store = IndexStore::new(tmp.path());
    let first = store
        .build_or_load(fp.clone(), chunks.clone(), embedder.clone())
        .await
        .unwrap();
    let after_first = embedder.embedded();
    assert_eq!(after_first, chunks.len());

    // a fresh store over the same directory, as another process would see it
    let reopened = IndexStore::new(tmp.path());
    let second = reopened
        .build_or_load(fp, chunks, embedder.clone())
        .await
        .unwrap();
    assert_eq!(embedder.embedded(), after_first);
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_requests_build_once() {
    let config = ChunkerConfig::default();
    let docs = [("a", document(3000))];
    let chunks = Chunker::new(config).unwrap().chunk_documents(&docs);
    let embedder = Arc::new(CountingEmbedder::new(Duration::from_millis(50)));
    let fp = ContentFingerprint::of(&docs, &config, embedder.model_id());

    let tmp = TempDir::new().unwrap();
    let store = IndexStore::new(tmp.path());
    let (a, b) = tokio::join!(
        store.build_or_load(fp.clone(), chunks.clone(), embedder.clone()),
        store.build_or_load(fp.clone(), chunks.clone(), embedder.clone()),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(embedder.embedded(), chunks.len());
}

#[tokio::test]
async fn abandoned_caller_still_persists() {
    let config = ChunkerConfig::default();
    let docs = [("a", document(1500))];
    let chunks = Chunker::new(config).unwrap().chunk_documents(&docs);
    let embedder = Arc::new(CountingEmbedder::new(Duration::from_millis(100)));
    let fp = ContentFingerprint::of(&docs, &config, embedder.model_id());

    let tmp = TempDir::new().unwrap();
    let store = IndexStore::new(tmp.path());
    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        store.build_or_load(fp.clone(), chunks.clone(), embedder.clone()),
    )
    .await;
    assert!(abandoned.is_err());

    // the next request waits for the in-flight build instead of starting another
    let index = store.build_or_load(fp.clone(), chunks.clone(), embedder.clone()).await.unwrap();
    assert_eq!(index.len(), chunks.len());
    assert_eq!(embedder.embedded(), chunks.len());
    assert!(store.index_path(&fp).exists());
}

#[tokio::test]
async fn changed_content_gets_a_new_index() {
    let config = ChunkerConfig::default();
    let embedder = Arc::new(CountingEmbedder::new(Duration::ZERO));
    let tmp = TempDir::new().unwrap();
    let store = IndexStore::new(tmp.path());

    for body in ["first fetch of the page", "second fetch, new numbers"] {
        let docs = [("https://example.test/news", body)];
        let chunks = Chunker::new(config).unwrap().chunk_documents(&docs);
        let fp = ContentFingerprint::of(&docs, &config, embedder.model_id());
        let index = store.build_or_load(fp, chunks, embedder.clone()).await.unwrap();
        assert_eq!(index.chunks().next().map(|c| c.text.as_str()), Some(body));
    }
    assert_eq!(embedder.embedded(), 2);
}
