use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::Chunk;

/// Break quality, best last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Word,
    Sentence,
    Paragraph,
}

/// Main chunker interface for splitting text into overlapping windows
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with a validated configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split one document. Sequence indices start at zero.
    #[must_use]
    pub fn chunk(&self, label: &str, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        self.chunk_into(label, text, &mut chunks);
        chunks
    }

    /// Split several documents in order, numbering chunks across the whole set.
    #[must_use]
    pub fn chunk_documents<L, T>(&self, documents: &[(L, T)]) -> Vec<Chunk>
    where
        L: AsRef<str>,
        T: AsRef<str>,
    {
        let mut chunks = Vec::new();
        for (label, text) in documents {
            self.chunk_into(label.as_ref(), text.as_ref(), &mut chunks);
        }
        log::debug!(
            "chunked {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );
        chunks
    }

    /// Bounded-content mode: only the first chunk of the document is kept and everything after
    /// it is discarded. Used when the caller wants a fixed-size excerpt rather than retrieval.
    #[must_use]
    pub fn leading_chunk(&self, label: &str, text: &str) -> Option<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return None;
        }
        let end = self.window_end(&chars, 0);
        if end < chars.len() {
            log::debug!(
                "'{label}' truncated to {end} of {} characters",
                chars.len()
            );
        }
        Some(make_chunk(label, 0, &chars, 0, end))
    }

    fn chunk_into(&self, label: &str, text: &str, out: &mut Vec<Chunk>) {
        let chars: Vec<char> = text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = self.window_end(&chars, start);
            out.push(make_chunk(label, out.len(), &chars, start, end));
            if end == chars.len() {
                break;
            }
            start = end - self.config.chunk_overlap;
        }
    }

    /// End of the chunk starting at `start`. Always greater than `start + chunk_overlap` so the
    /// next chunk advances.
    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let limit = (start + self.config.chunk_size).min(chars.len());
        let lookback = self.config.effective_lookback();
        if limit == chars.len() || lookback == 0 {
            return limit;
        }

        let floor = limit
            .saturating_sub(lookback)
            .max(start + self.config.chunk_overlap + 1);
        let mut best: Option<(Break, usize)> = None;
        for end in (floor..=limit).rev() {
            if let Some(kind) = break_before(chars, end) {
                if best.map_or(true, |(found, _)| kind > found) {
                    best = Some((kind, end));
                }
                if kind == Break::Paragraph {
                    break;
                }
            }
        }
        best.map_or(limit, |(_, end)| end)
    }
}

/// Classify the position just before `chars[end]` as a break point.
fn break_before(chars: &[char], end: usize) -> Option<Break> {
    let last = *chars.get(end.checked_sub(1)?)?;
    if !last.is_whitespace() {
        return None;
    }
    let prev = end.checked_sub(2).and_then(|idx| chars.get(idx)).copied();
    match (prev, last) {
        (Some('\n'), '\n') => Some(Break::Paragraph),
        (_, '\n') => Some(Break::Sentence),
        (Some('.' | '!' | '?'), _) => Some(Break::Sentence),
        _ => Some(Break::Word),
    }
}

fn make_chunk(label: &str, sequence_index: usize, chars: &[char], start: usize, end: usize) -> Chunk {
    Chunk {
        source_label: label.to_string(),
        sequence_index,
        text: chars[start..end].iter().collect(),
        char_start: start,
        char_end: end,
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_chars: usize,
    pub min_chars: usize,
    pub max_chars: usize,
}

impl ChunkingStats {
    #[must_use]
    pub fn of(chunks: &[Chunk]) -> Self {
        Self {
            total_chunks: chunks.len(),
            total_chars: chunks.iter().map(Chunk::char_len).sum(),
            min_chars: chunks.iter().map(Chunk::char_len).min().unwrap_or(0),
            max_chars: chunks.iter().map(Chunk::char_len).max().unwrap_or(0),
        }
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Chars: {} | Range: {}-{}",
            self.total_chunks, self.total_chars, self.min_chars, self.max_chars
        )
    }
}
