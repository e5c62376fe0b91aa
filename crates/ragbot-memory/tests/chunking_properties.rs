#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property tests for the sliding-window chunker.

use proptest::prelude::*;
use ragbot_memory::{Document, FixedSizeChunker};

/// Chunk size and overlap with `overlap < size`.
fn window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
    match len {
        0 => 0,
        l if l <= overlap => 1,
        l => (l - overlap).div_ceil(size - overlap),
    }
}

proptest! {
    #[test]
    fn chunk_count_matches_formula(text in "\\PC{0,300}", (size, overlap) in window()) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&Document::new("doc", text.clone()));
        let len = text.chars().count();
        prop_assert_eq!(chunks.len(), expected_count(len, size, overlap));
    }

    #[test]
    fn chunks_reconstruct_document(text in "\\PC{0,300}", (size, overlap) in window()) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&Document::new("doc", text.clone()));

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            rebuilt.extend(chunk.text.chars().skip(skip));
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunks_respect_size_and_offsets(text in "\\PC{1,300}", (size, overlap) in window()) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&Document::new("doc", text.clone()));
        let chars: Vec<char> = text.chars().collect();

        for (i, chunk) in chunks.iter().enumerate() {
            let n = chunk.text.chars().count();
            prop_assert!(n <= size);
            prop_assert!(n > 0);
            prop_assert_eq!(chunk.index, i);
            prop_assert_eq!(chunk.start, i * (size - overlap));
            let expected: String = chars[chunk.start..chunk.start + n].iter().collect();
            prop_assert_eq!(&chunk.text, &expected);
            if i + 1 < chunks.len() {
                prop_assert_eq!(n, size);
            }
        }
    }
}

#[test]
fn invalid_windows_are_rejected() {
    assert!(FixedSizeChunker::new(0, 0).is_err());
    assert!(FixedSizeChunker::new(10, 10).is_err());
    assert!(FixedSizeChunker::new(10, 11).is_err());
}
