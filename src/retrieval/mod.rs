//! Retrieval engines
//!
//! Implements lexical (BM25), semantic (exact inner-product), and reranking
//! fusion retrieval strategies over a fixed corpus of documents.

use crate::data::Document;
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod lexical;
pub mod rerank;
pub mod semantic;

// Re-exports
pub use lexical::*;
pub use rerank::*;
pub use semantic::*;

/// Metadata describing a fitted index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Model name used for embeddings ("bm25" for the lexical index)
    pub model_name: String,
    /// Embedding dimension (0 for the lexical index)
    pub dimension: usize,
    /// Number of documents indexed
    pub num_documents: usize,
    /// Index creation timestamp
    pub created_at: String,
}

impl IndexMetadata {
    /// Create metadata stamped with the current time
    pub fn new(model_name: &str, dimension: usize, num_documents: usize) -> Self {
        Self {
            model_name: model_name.to_string(),
            dimension,
            num_documents,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for retrieval engines.
///
/// Retrievers are fitted once against an ordered corpus and are read-only
/// afterwards; `query` never mutates the index, so a fitted retriever can
/// serve concurrent queries.
pub trait Retriever: Send + Sync {
    /// Retrieve the most relevant documents for a query, ranked descending
    /// by relevance
    fn query(&self, query: &str) -> Result<Vec<Document>>;

    /// Whether this retriever is keyword-based and benefits from receiving a
    /// keyword-only query instead of the full natural-language question.
    ///
    /// Fixed at construction time; callers route queries on this flag rather
    /// than inspecting the concrete type.
    fn supports_lexical_query(&self) -> bool {
        false
    }

    /// Get the name of this retriever
    fn name(&self) -> &str;
}
