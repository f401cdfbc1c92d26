//! # Marketlens Vector Store
//!
//! Similarity search over text chunks, persisted per content fingerprint.
//!
//! ## Architecture
//!
//! ```text
//! Chunk[]
//!     │
//!     ├──> EmbeddingProvider (injected: stub, OpenAI-compatible, test double)
//!     │      └─> Vec<f32>[dimension]
//!     │
//!     ├──> SimilarityIndex
//!     │      └─> brute-force cosine, ties by sequence index
//!     │
//!     └──> IndexStore
//!            ├─> <root>/<sha256>.json (schema-versioned, temp file + rename)
//!            └─> one build per fingerprint (async mutex + fs2 file lock)
//! ```
//!
//! An index is keyed by the SHA-256 of the document set it was built from together with the
//! chunking parameters and embedding model, so an index for other content is never served.
//!
//! ## Example
//!
//! ```no_run
//! use marketlens_chunker::{Chunker, ChunkerConfig};
//! use marketlens_vector_store::{ContentFingerprint, IndexStore, StubEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ChunkerConfig::default();
//!     let docs = [("filing", "Revenue grew 12% year on year.")];
//!     let chunks = Chunker::new(config)?.chunk_documents(&docs);
//!
//!     let embedder = Arc::new(StubEmbedder::default());
//!     let fingerprint = ContentFingerprint::of(&docs, &config, "stub-64");
//!     let store = IndexStore::new("indexes");
//!     let index = store.build_or_load(fingerprint, chunks, embedder.clone()).await?;
//!
//!     for hit in index.query("revenue growth", 3, embedder.as_ref()).await? {
//!         println!("{}: {:.3}", hit.chunk.sequence_index, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod fingerprint;
mod index;
mod lock;
mod paths;
mod store;
mod types;

pub use embeddings::{cosine_similarity, EmbeddingProvider, StubEmbedder, STUB_DIMENSION};
pub use error::{Result, VectorStoreError};
pub use fingerprint::ContentFingerprint;
pub use index::SimilarityIndex;
pub use paths::{index_path, lock_path};
pub use store::{IndexStore, INDEX_SCHEMA_VERSION};
pub use types::{ScoredChunk, StoredChunk};

// Re-export chunk types for convenience
pub use marketlens_chunker::{Chunk, ChunkerConfig};
