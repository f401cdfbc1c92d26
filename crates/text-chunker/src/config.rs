use serde::{Deserialize, Serialize};

/// Configuration for text chunking. All sizes are in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk length
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// How far back from the window end a paragraph, sentence or word break is searched for.
    /// Zero disables boundary search and splits at exactly `chunk_size`. Capped at
    /// `stride() - 1` so a small window still advances.
    pub boundary_lookback: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            boundary_lookback: 80,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub const fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            boundary_lookback: 0,
        }
    }

    #[must_use]
    pub const fn with_boundary_lookback(mut self, boundary_lookback: usize) -> Self {
        self.boundary_lookback = boundary_lookback;
        self
    }

    /// Characters each chunk contributes beyond the previous one.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Lookback actually applied: `boundary_lookback` capped below the stride.
    #[must_use]
    pub fn effective_lookback(&self) -> usize {
        self.boundary_lookback
            .min(self.stride().saturating_sub(1))
    }

    /// Validate configuration. Any `chunk_size > 0` with `chunk_overlap < chunk_size` is
    /// accepted; the lookback never makes a configuration invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }

        Ok(())
    }
}
