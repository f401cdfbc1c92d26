//! # Marketlens Chunker
//!
//! Splits normalized document text into overlapping chunks for similarity retrieval.
//!
//! Chunks are measured in Unicode scalar values. Consecutive chunks overlap by exactly
//! `chunk_overlap` characters, so dropping that prefix from every chunk after the first and
//! concatenating reconstructs the input. Within the last `boundary_lookback` characters of a
//! window (capped below the stride) the chunker prefers, in order, a paragraph break, a sentence or line end, then any
//! whitespace; with no break it cuts at exactly `chunk_size`.
//!
//! ## Example
//!
//! ```rust
//! use marketlens_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(1000, 100)).unwrap();
//! let text = "x".repeat(4600);
//! let chunks = chunker.chunk("filing", &text);
//! assert_eq!(chunks.len(), 5);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::{Chunker, ChunkingStats};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use types::Chunk;
