//! Fixed-size character windows with overlap

use crate::config::ChunkingConfig;

/// Splits text into windows of at most `chunk_size` characters.
///
/// Window `i` starts at character `i * (chunk_size - overlap)`; the last window
/// ends at the end of the text. Consecutive windows share exactly `overlap`
/// characters, so nothing is lost at a boundary.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk length in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker.
    ///
    /// `overlap` is clamped below `chunk_size`; [`RagConfig::validate`](crate::config::RagConfig::validate)
    /// rejects such configurations before they get here.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create from chunking configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk length
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Shared characters between consecutive chunks
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping windows. Empty text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offsets of every char boundary, plus the end of the text
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;

        if len == 0 {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::with_capacity(self.expected_chunks(len));
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(len);
            chunks.push(text[bounds[start]..bounds[end]].to_string());
            if end == len {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Number of chunks produced for a text of `len` characters
    pub fn expected_chunks(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        if len <= self.chunk_size {
            return 1;
        }
        let step = self.chunk_size - self.overlap;
        (len - self.overlap).div_ceil(step)
    }
}
