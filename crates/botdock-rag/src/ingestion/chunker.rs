//! Fixed-window text chunking with overlap
//!
//! Splits document text into the overlapping character windows that become
//! embedding records. Pure and deterministic: identical input always yields
//! the identical chunk sequence, so a failed ingestion can re-chunk from
//! scratch and reproduce the same indices.

use crate::error::{Error, Result};

/// Overlapping fixed-size window chunker.
#[derive(Debug)]
pub struct Chunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
}

impl Chunker {
    /// Create a chunker.
    ///
    /// `overlap >= chunk_size` makes the window advance non-positive and the
    /// sequence infinite, so it is rejected up front.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Split text into ordered overlapping windows.
    ///
    /// Each window covers `chunk_size` characters starting `chunk_size -
    /// overlap` after the previous one; the final window is clipped to the
    /// text length and emitted exactly once, even though the advance rule
    /// alone would repeat it.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        // Char-boundary byte offsets; windows are measured in characters but
        // sliced on byte offsets to stay valid UTF-8.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        let total_chars = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            chunks.push(&text[bounds[start]..bounds[end]]);

            let next = end.saturating_sub(self.overlap);
            if next <= start || next >= total_chars {
                break;
            }
            start = next;
        }

        chunks
    }

    /// Configured chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Configured overlap
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}
