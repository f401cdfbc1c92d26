use marketlens_chunker::ChunkerConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier of a document set plus the parameters an index was built with.
///
/// Two fingerprints are equal only when the same `(source, body)` pairs (in any order) were
/// chunked with the same configuration and embedded by the same model. Callers chunk the
/// documents in sorted `(source, body)` order so a reused index numbers its chunks the same
/// way whatever order the sources were given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    #[must_use]
    pub fn of<S, B>(documents: &[(S, B)], chunking: &ChunkerConfig, model_id: &str) -> Self
    where
        S: AsRef<str>,
        B: AsRef<str>,
    {
        let mut sorted: Vec<(&str, &str)> = documents
            .iter()
            .map(|(source, body)| (source.as_ref(), body.as_ref()))
            .collect();
        sorted.sort_unstable();

        let mut hasher = Sha256::new();
        for (source, body) in sorted {
            // length prefixes keep ("ab", "c") distinct from ("a", "bc")
            hasher.update((source.len() as u64).to_be_bytes());
            hasher.update(source.as_bytes());
            hasher.update((body.len() as u64).to_be_bytes());
            hasher.update(body.as_bytes());
        }
        hasher.update(
            format!(
                "chunk_size={};chunk_overlap={};boundary_lookback={};model={model_id}",
                chunking.chunk_size, chunking.chunk_overlap, chunking.effective_lookback()
            )
            .as_bytes(),
        );
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
