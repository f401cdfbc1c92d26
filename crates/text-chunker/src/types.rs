use serde::{Deserialize, Serialize};

/// A bounded, overlapping slice of a source text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Label of the document the chunk was cut from
    pub source_label: String,

    /// Position within the chunked document set, unique across documents
    pub sequence_index: usize,

    /// The chunk text
    pub text: String,

    /// Start offset in characters (inclusive)
    pub char_start: usize,

    /// End offset in characters (exclusive)
    pub char_end: usize,
}

impl Chunk {
    #[must_use]
    pub const fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }

    /// Text with the first `overlap` characters removed.
    #[must_use]
    pub fn without_overlap(&self, overlap: usize) -> &str {
        match self.text.char_indices().nth(overlap) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }
}
