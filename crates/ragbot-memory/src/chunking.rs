//! Fixed-size sliding window chunking.

use crate::document::{Chunk, Document};
use ragbot_core::{RagbotError, RagbotResult};

/// Splits text into chunks of at most `chunk_size` characters, consecutive
/// chunks sharing exactly `chunk_overlap` characters.
///
/// Sizes are counted in `char`s, never bytes, so multi-byte text is never cut
/// inside a code point. A document of `L > chunk_overlap` characters yields
/// `ceil((L - overlap) / (size - overlap))` chunks; only the last one may be
/// shorter than `chunk_size`.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a chunker. Fails unless `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> RagbotResult<Self> {
        if chunk_size == 0 {
            return Err(RagbotError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagbotError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a document. Empty text produces no chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text.as_str();
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;
        if total == 0 {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::with_capacity(total / step + 1);
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total);
            chunks.push(Chunk {
                text: text[boundaries[start]..boundaries[end]].to_string(),
                source: document.source.clone(),
                index: chunks.len(),
                start,
            });
            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Split every document, preserving document order.
    pub fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.chunk(d)).collect()
    }
}
