use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, VectorStoreError};
use crate::fingerprint::ContentFingerprint;
use crate::index::SimilarityIndex;
use crate::lock::acquire_build_lock;
use crate::paths::{index_path, lock_path};
use marketlens_chunker::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub const INDEX_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    schema_version: u32,
    index: SimilarityIndex,
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;
type KeyLocks = HashMap<ContentFingerprint, KeyLock>;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory of persisted indexes keyed by content fingerprint.
///
/// Cloning is cheap; clones share the in-process build locks.
#[derive(Clone)]
pub struct IndexStore {
    root: PathBuf,
    building: Arc<Mutex<KeyLocks>>,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            building: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn index_path(&self, fingerprint: &ContentFingerprint) -> PathBuf {
        index_path(&self.root, fingerprint)
    }

    /// Write the index atomically: a uniquely named temp file is renamed into place after a
    /// full write. Writers of the same fingerprint are serialized in this process and across
    /// processes sharing the directory.
    pub async fn persist(&self, index: &SimilarityIndex) -> Result<PathBuf> {
        let fingerprint = index.fingerprint().clone();
        let key_lock = self.key_lock(&fingerprint);
        let result = {
            let _in_process = key_lock.lock().await;
            match acquire_build_lock(lock_path(&self.root, &fingerprint)).await {
                Ok(_cross_process) => persist_in(&self.root, index).await,
                Err(err) => Err(err),
            }
        };
        release_key(&self.building, &fingerprint, key_lock);
        result
    }

    /// Load the index for `fingerprint`. Missing, unreadable, wrong-schema or mismatching blobs
    /// all yield `None` so the caller rebuilds.
    pub async fn load(&self, fingerprint: &ContentFingerprint) -> Result<Option<SimilarityIndex>> {
        load_from(&self.root, fingerprint).await
    }

    /// Return the persisted index for `fingerprint`, building and persisting it first when
    /// absent or stale.
    ///
    /// At most one build per fingerprint runs at a time, across tasks of this store and across
    /// processes sharing the directory. The build runs in its own task: dropping the returned
    /// future does not abort a build that already started, and its result is still persisted.
    pub async fn build_or_load(
        &self,
        fingerprint: ContentFingerprint,
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Arc<SimilarityIndex>> {
        let key_lock = self.key_lock(&fingerprint);
        let building = Arc::clone(&self.building);
        let root = self.root.clone();

        let task = tokio::spawn(async move {
            let result = {
                let _in_process = key_lock.lock().await;
                load_or_build(&root, &fingerprint, chunks, embedder.as_ref()).await
            };
            release_key(&building, &fingerprint, key_lock);
            result
        });

        let index = task
            .await
            .map_err(|err| VectorStoreError::LockError(format!("join index build: {err}")))??;
        Ok(Arc::new(index))
    }

    fn key_lock(&self, fingerprint: &ContentFingerprint) -> KeyLock {
        let mut building = self
            .building
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(building.entry(fingerprint.clone()).or_default())
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.building
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Drop the map entry once no other caller holds or waits on `key_lock`. Clones are only
/// handed out under the map mutex, so the count cannot grow while it is held.
fn release_key(building: &Mutex<KeyLocks>, fingerprint: &ContentFingerprint, key_lock: KeyLock) {
    let mut map = building.lock().unwrap_or_else(PoisonError::into_inner);
    // the map's copy plus ours
    if Arc::strong_count(&key_lock) == 2 {
        map.remove(fingerprint);
    }
}

async fn load_or_build(
    root: &Path,
    fingerprint: &ContentFingerprint,
    chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
) -> Result<SimilarityIndex> {
    let _cross_process = acquire_build_lock(lock_path(root, fingerprint)).await?;

    if let Some(index) = load_from(root, fingerprint).await? {
        log::debug!("reusing persisted index {}", fingerprint.short());
        return Ok(index);
    }

    log::info!(
        "building index {} over {} chunks",
        fingerprint.short(),
        chunks.len()
    );
    let index = SimilarityIndex::build(fingerprint.clone(), chunks, embedder).await?;
    persist_in(root, &index).await?;
    Ok(index)
}

async fn persist_in(root: &Path, index: &SimilarityIndex) -> Result<PathBuf> {
    tokio::fs::create_dir_all(root).await?;
    let path = index_path(root, index.fingerprint());
    let persisted = PersistedIndex {
        schema_version: INDEX_SCHEMA_VERSION,
        index: index.clone(),
    };
    let bytes = serde_json::to_vec(&persisted)?;
    let tmp = path.with_extension(format!(
        "{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, &path).await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    log::debug!("persisted index to {}", path.display());
    Ok(path)
}

async fn load_from(root: &Path, fingerprint: &ContentFingerprint) -> Result<Option<SimilarityIndex>> {
    let path = index_path(root, fingerprint);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let persisted: PersistedIndex = match serde_json::from_slice(&bytes) {
        Ok(persisted) => persisted,
        Err(err) => {
            log::warn!("discarding unreadable index {}: {err}", path.display());
            return Ok(None);
        }
    };
    if persisted.schema_version != INDEX_SCHEMA_VERSION {
        log::warn!(
            "discarding index {} with schema_version {} (expected {INDEX_SCHEMA_VERSION})",
            path.display(),
            persisted.schema_version
        );
        return Ok(None);
    }
    if persisted.index.fingerprint() != fingerprint || !persisted.index.is_consistent() {
        log::warn!("discarding stale index {}", path.display());
        return Ok(None);
    }
    Ok(Some(persisted.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::StubEmbedder;
    use marketlens_chunker::ChunkerConfig;
    use tempfile::TempDir;

    fn chunk(idx: usize, text: &str) -> Chunk {
        Chunk {
            source_label: "doc".to_string(),
            sequence_index: idx,
            text: text.to_string(),
            char_start: 0,
            char_end: text.chars().count(),
        }
    }

    #[tokio::test]
    async fn persist_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        let embedder = StubEmbedder::new(8);
        let fp = ContentFingerprint::of(&[("a", "alpha")], &ChunkerConfig::default(), "stub-8");
        let index = SimilarityIndex::build(fp.clone(), vec![chunk(0, "alpha")], &embedder)
            .await
            .unwrap();

        let path = store.persist(&index).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.load(&fp).await.unwrap(), Some(index));
        assert_eq!(store.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn concurrent_persists_of_one_key_never_corrupt_it() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        let embedder = StubEmbedder::new(64);
        let fp = ContentFingerprint::of(&[("a", "many")], &ChunkerConfig::default(), "stub-64");
        let chunks = (0..200)
            .map(|idx| chunk(idx, &format!("chunk number {idx} of the filing")))
            .collect();
        let index = Arc::new(SimilarityIndex::build(fp.clone(), chunks, &embedder).await.unwrap());

        for _ in 0..5 {
            let writers: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    let index = Arc::clone(&index);
                    tokio::spawn(async move { store.persist(&index).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }
            assert_eq!(store.load(&fp).await.unwrap().as_ref(), Some(index.as_ref()));
        }

        assert_eq!(store.tracked_keys(), 0);
        for entry in std::fs::read_dir(tmp.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(
                name.ends_with(".json") || name.ends_with(".lock"),
                "leftover file {name}"
            );
        }
    }

    #[tokio::test]
    async fn finished_builds_release_their_key() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(StubEmbedder::new(8));
        for body in ["one", "two", "three"] {
            let fp = ContentFingerprint::of(&[("a", body)], &ChunkerConfig::default(), "stub-8");
            store
                .build_or_load(fp, vec![chunk(0, body)], Arc::clone(&embedder))
                .await
                .unwrap();
        }
        assert_eq!(store.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn missing_and_corrupt_blobs_load_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        let fp = ContentFingerprint::of(&[("a", "alpha")], &ChunkerConfig::default(), "stub-8");
        assert!(store.load(&fp).await.unwrap().is_none());

        std::fs::write(store.index_path(&fp), b"{not json").unwrap();
        assert!(store.load(&fp).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blob_under_wrong_key_is_stale() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path());
        let embedder = StubEmbedder::new(8);
        let config = ChunkerConfig::default();
        let old = ContentFingerprint::of(&[("a", "yesterday")], &config, "stub-8");
        let new = ContentFingerprint::of(&[("a", "today")], &config, "stub-8");

        let index = SimilarityIndex::build(old.clone(), vec![chunk(0, "yesterday")], &embedder)
            .await
            .unwrap();
        let old_path = store.persist(&index).await.unwrap();
        std::fs::copy(&old_path, store.index_path(&new)).unwrap();

        assert!(store.load(&new).await.unwrap().is_none());
    }
}
