//! Fixed-size sliding-window chunking for embedding input.
//!
//! Text is split into windows of `size` characters, each starting `size - overlap`
//! characters after the previous one. Offsets count Unicode scalar values, so a
//! window never splits a multi-byte character.
//!
//! # Example
//!
//! ```
//! use contentai_core::chunking::{ChunkerConfig, SlidingWindowChunker};
//!
//! let chunker = SlidingWindowChunker::new(ChunkerConfig::new(50, 10).unwrap());
//! let text = "x".repeat(120);
//! let chunks = chunker.chunk(&text);
//!
//! let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
//! assert_eq!(spans, vec![(0, 50), (40, 90), (80, 120)]);
//! ```

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Window size and overlap for [`SlidingWindowChunker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    size: usize,
    overlap: usize,
}

impl ChunkerConfig {
    /// Build a configuration, rejecting `size == 0` and `overlap >= size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidInput(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= size {
            return Err(Error::InvalidInput(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    /// Characters per chunk.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Characters shared by adjacent chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of two adjacent chunks.
    pub fn stride(&self) -> usize {
        self.size - self.overlap
    }

    /// Number of chunks produced for a text of `len` characters.
    pub fn expected_chunks(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        len.saturating_sub(self.overlap).div_ceil(self.stride()).max(1)
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            size: defaults::CHUNK_SIZE,
            overlap: defaults::CHUNK_OVERLAP,
        }
    }
}

/// One window of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the chunk sequence.
    pub index: usize,
    /// Start offset in characters (inclusive).
    pub start: usize,
    /// End offset in characters (exclusive).
    pub end: usize,
    /// The window's text.
    pub text: String,
}

impl Chunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk has no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Deterministic overlapping-window chunker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlidingWindowChunker {
    config: ChunkerConfig,
}

impl SlidingWindowChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into overlapping windows.
    ///
    /// Empty text yields no chunks. Windows are emitted until one reaches the
    /// end of the text, so the last window may be shorter than `size` and
    /// no window is wholly contained in its predecessor.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        // Byte offset of every char, plus the end of the string.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let len = bounds.len();
        bounds.push(text.len());

        let mut chunks = Vec::with_capacity(self.config.expected_chunks(len));
        let mut start = 0;
        while start < len {
            let end = (start + self.config.size).min(len);
            chunks.push(Chunk {
                index: chunks.len(),
                start,
                end,
                text: text[bounds[start]..bounds[end]].to_string(),
            });
            if end == len {
                break;
            }
            start += self.config.stride();
        }

        tracing::trace!(
            subsystem = "core",
            component = "chunker",
            chunk_count = chunks.len(),
            text_len = len,
            "Chunked text"
        );
        chunks
    }
}

/// Reassemble chunk texts produced with `overlap` into the original text.
pub fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for chunk in chunks {
        if chunk.index == 0 {
            out.push_str(&chunk.text);
        } else {
            out.extend(chunk.text.chars().skip(overlap));
        }
    }
    out
}
