//! Generic text chunking
//!
//! Splits long documents into overlapping windows before indexing. Chunking
//! is format-agnostic; the scrapers that understand specific documentation
//! layouts live outside this crate and feed JSONL dumps in directly.

use crate::data::Document;
use anyhow::Result;

/// Configuration for chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Size of each chunk in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

/// Overlapping chunker producing fixed-size windows over a document.
///
/// Each chunk keeps the parent document's source so retrieval results stay
/// attributable.
pub struct OverlappingChunker {
    config: ChunkConfig,
}

impl OverlappingChunker {
    /// Create a new overlapping chunker with the given configuration
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Split a document into chunks
    pub fn chunk(&self, document: &Document) -> Result<Vec<Document>> {
        if self.config.chunk_size == 0 {
            anyhow::bail!("chunk_size must be positive");
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.config.chunk_overlap,
                self.config.chunk_size
            );
        }

        let chars: Vec<char> = document.text.chars().collect();
        let mut chunks = Vec::new();

        if chars.is_empty() {
            return Ok(chunks);
        }

        let step_size = self.config.chunk_size - self.config.chunk_overlap;
        let mut start_pos = 0;

        while start_pos < chars.len() {
            let end_pos = (start_pos + self.config.chunk_size).min(chars.len());
            let text: String = chars[start_pos..end_pos].iter().collect();

            chunks.push(Document::new(document.source.clone(), text));

            if end_pos >= chars.len() {
                break;
            }
            start_pos += step_size;
        }

        Ok(chunks)
    }

    /// Split every document of a corpus, preserving document order
    pub fn chunk_corpus(&self, corpus: &[Document]) -> Result<Vec<Document>> {
        let mut chunks = Vec::new();
        for document in corpus {
            chunks.extend(self.chunk(document)?);
        }
        tracing::debug!(
            "Chunked {} documents into {} chunks",
            corpus.len(),
            chunks.len()
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_short_document_is_untouched() {
        let chunker = OverlappingChunker::new(ChunkConfig::default());
        let doc = Document::new("guide", "short text");

        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
        assert_eq!(chunks[0].source, "guide");
    }

    #[test]
    fn test_chunk_overlap() {
        let chunker = OverlappingChunker::new(ChunkConfig {
            chunk_size: 10,
            chunk_overlap: 4,
        });
        let doc = Document::new("guide", "abcdefghijklmnop");

        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks[0].text, "abcdefghij");
        // Next window starts chunk_size - chunk_overlap = 6 characters in.
        assert_eq!(chunks[1].text, "ghijklmnop");
    }

    #[test]
    fn test_chunk_rejects_overlap_not_smaller_than_size() {
        let chunker = OverlappingChunker::new(ChunkConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        });
        let doc = Document::new("guide", "abcdefghijklmnop");

        assert!(chunker.chunk(&doc).is_err());
    }

    #[test]
    fn test_chunk_empty_document() {
        let chunker = OverlappingChunker::new(ChunkConfig::default());
        let doc = Document::new("guide", "");

        let chunks = chunker.chunk(&doc).unwrap();
        assert!(chunks.is_empty());
    }
}
