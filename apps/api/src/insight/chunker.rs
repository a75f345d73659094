//! Text chunking — fixed-size token windows with exact overlap.
//!
//! Tokens are whitespace-delimited words carrying their byte offsets, so a
//! chunk's text is always an exact slice of the source document. Windows of
//! `chunk_size` tokens advance by `chunk_size - chunk_overlap`, which makes
//! boundaries deterministic and gives consecutive chunks exactly
//! `chunk_overlap` shared tokens.

use anyhow::{ensure, Result};

/// One retrieval unit: an immutable text span plus source offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position of this chunk in document order. Ranking ties break on it.
    pub index: usize,
    /// Exact slice of the source text covered by this chunk's tokens.
    pub text: String,
    /// Byte offset of the first token in the source text.
    pub start: usize,
    /// Byte offset one past the last token in the source text.
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Token count ceiling per chunk.
    pub chunk_size: usize,
    /// Tokens shared between adjacent chunks. Must be < `chunk_size`.
    pub chunk_overlap: usize,
}

pub struct TokenWindowChunker {
    config: ChunkerConfig,
}

impl TokenWindowChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        ensure!(config.chunk_size > 0, "chunk_size must be at least 1");
        ensure!(
            config.chunk_overlap < config.chunk_size,
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            config.chunk_overlap,
            config.chunk_size
        );
        Ok(Self { config })
    }

    /// Splits `text` into overlapping chunks covering every token.
    /// Same input and config always produce identical boundaries.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let step = size - self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start_token = 0;
        loop {
            let end_token = (start_token + size).min(tokens.len());
            let start = tokens[start_token].0;
            let end = tokens[end_token - 1].1;
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[start..end].to_string(),
                start,
                end,
            });

            if end_token == tokens.len() {
                break;
            }
            start_token += step;
        }

        chunks
    }
}

/// Byte ranges of the whitespace-delimited tokens in `text`.
fn tokenize(text: &str) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((s, text.len()));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> TokenWindowChunker {
        TokenWindowChunker::new(ChunkerConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    fn words(chunk: &Chunk) -> Vec<&str> {
        chunk.text.split_whitespace().collect()
    }

    #[test]
    fn test_empty_text_produces_no_chunks() {
        assert!(chunker(8, 2).chunk("").is_empty());
        assert!(chunker(8, 2).chunk("  \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let chunks = chunker(50, 10).chunk("Jane Doe, Data Engineer");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Jane Doe, Data Engineer");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn test_chunk_text_is_exact_source_slice() {
        let text = "alpha  beta\ngamma\tdelta epsilon zeta";
        for chunk in chunker(3, 1).chunk(text) {
            assert_eq!(chunk.text, &text[chunk.start..chunk.end]);
        }
    }

    #[test]
    fn test_consecutive_chunks_share_exactly_overlap_tokens() {
        let text: String = (0..40).map(|i| format!("w{i} ")).collect();
        let chunks = chunker(10, 3).chunk(&text);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let prev = words(&pair[0]);
            let next = words(&pair[1]);
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
    }

    /// Stitching windows back together (dropping each successor's overlap
    /// prefix) must reproduce the document's token sequence exactly.
    #[test]
    fn test_reconstruction_for_various_parameters() {
        let text: String = (0..57).map(|i| format!("token{i} ")).collect();
        let original: Vec<&str> = text.split_whitespace().collect();

        for (size, overlap) in [(8, 0), (8, 3), (10, 9), (57, 5), (100, 0)] {
            let chunks = chunker(size, overlap).chunk(&text);

            let mut reconstructed: Vec<&str> = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let mut toks = words(chunk);
                if i > 0 {
                    toks.drain(..overlap.min(toks.len()));
                }
                reconstructed.extend(toks);
            }
            assert_eq!(
                reconstructed, original,
                "reconstruction failed for size={size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text: String = (0..30).map(|i| format!("w{i} ")).collect();
        let a = chunker(7, 2).chunk(&text);
        let b = chunker(7, 2).chunk(&text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_token_is_covered() {
        let text: String = (0..23).map(|i| format!("w{i} ")).collect();
        let chunks = chunker(5, 2).chunk(&text);
        assert_eq!(chunks.first().unwrap().start, 0);
        assert_eq!(chunks.last().unwrap().end, text.trim_end().len());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let result = TokenWindowChunker::new(ChunkerConfig {
            chunk_size: 4,
            chunk_overlap: 4,
        });
        assert!(result.is_err());
    }
}
