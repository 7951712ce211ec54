//! Corpus loading and chunking
//!
//! This module provides the `Document` unit of retrievable content and
//! functionality for loading a corpus from plain text, markdown, and JSONL
//! chunk dumps, plus a generic overlapping chunker for long documents.

use serde::{Deserialize, Serialize};

pub mod chunkers;
pub mod loaders;

// Re-exports for convenience
pub use chunkers::*;
pub use loaders::*;

/// A unit of retrievable content.
///
/// Documents are held in an ordered corpus; the position of a document in
/// that sequence is its canonical identity inside the fitted indexes, fixed
/// at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier or URL of the origin
    pub source: String,
    /// Text content
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Build a corpus of documents from bare strings, using the position as the
/// source identifier.
pub fn corpus_from_texts<I, S>(texts: I) -> Vec<Document>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Document::new(format!("text {i}"), text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_from_texts() {
        let corpus = corpus_from_texts(["xxx", "yyy"]);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].source, "text 0");
        assert_eq!(corpus[0].text, "xxx");
        assert_eq!(corpus[1].source, "text 1");
    }
}
