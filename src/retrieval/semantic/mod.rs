//! Semantic retrieval over an exact inner-product index
//!
//! The corpus is embedded through the injected `Embedder` and stored in a
//! flat index searched exhaustively. Embeddings are L2-normalized on the
//! retrieval side, at fit and at query time, so inner product equals cosine
//! similarity regardless of what the embedding backend produces.

use crate::data::Document;
use crate::embedding::{normalize_embedding, Embedder, Embedding};
use crate::retrieval::{IndexMetadata, Retriever};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Flat index for exact inner-product nearest-neighbor search.
///
/// Every query scans all rows; results are deterministic, with ties broken
/// by insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIpIndex {
    dimension: usize,
    vectors: Vec<Embedding>,
}

impl FlatIpIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a vector; its row index is its identity
    pub fn add(&mut self, vector: Embedding) -> Result<()> {
        if vector.len() != self.dimension {
            anyhow::bail!(
                "Vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            );
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Exact top-k search by inner product, descending
    pub fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            anyhow::bail!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            );
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vector)| {
                let score: f32 = vector.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (row, score)
            })
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Configuration for the semantic retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Number of documents to retrieve per query
    pub top_k: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self { top_k: 1 }
    }
}

impl SemanticConfig {
    /// Set the number of documents to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Serialized form of the fitted semantic index
#[derive(Serialize, Deserialize)]
struct SemanticIndexState {
    index: FlatIpIndex,
    corpus: Vec<Document>,
    config: SemanticConfig,
    metadata: IndexMetadata,
}

/// Semantic retriever performing exact nearest-neighbor search over
/// normalized corpus embeddings
pub struct SemanticRetriever {
    index: FlatIpIndex,
    corpus: Vec<Document>,
    embedder: Arc<dyn Embedder>,
    config: SemanticConfig,
    metadata: IndexMetadata,
}

impl SemanticRetriever {
    /// Embed the corpus and build the index
    pub fn fit(
        corpus: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        config: SemanticConfig,
    ) -> Result<Self> {
        if corpus.is_empty() {
            anyhow::bail!("Cannot fit semantic index on an empty corpus");
        }
        if config.top_k == 0 {
            anyhow::bail!("top_k must be positive");
        }

        let dimension = embedder.dimension();
        tracing::info!(
            "Fitting semantic index: {} documents, {} dimensions",
            corpus.len(),
            dimension
        );

        let texts: Vec<&str> = corpus.iter().map(|doc| doc.text.as_str()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .context("Failed to embed corpus")?;

        let mut index = FlatIpIndex::new(dimension);
        for mut embedding in embeddings {
            normalize_embedding(&mut embedding);
            index.add(embedding)?;
        }

        let metadata = IndexMetadata::new(embedder.model_name(), dimension, corpus.len());

        tracing::info!("Semantic index fitted");

        Ok(Self {
            index,
            corpus,
            embedder,
            config,
            metadata,
        })
    }

    /// Retrieve up to `top_k` documents ordered by descending cosine
    /// similarity.
    ///
    /// Every corpus document is a valid neighbor, so the returned count is
    /// `min(top_k, corpus_size)`.
    pub fn query_top_k(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let mut query_embedding = self
            .embedder
            .embed(query)
            .context("Failed to embed query")?;
        normalize_embedding(&mut query_embedding);

        let hits = self.index.search(&query_embedding, top_k)?;

        Ok(hits
            .into_iter()
            .map(|(row, _)| self.corpus[row].clone())
            .collect())
    }

    /// Save the fitted index to a directory.
    ///
    /// The embedding matrix is persisted, so loading does not re-embed the
    /// corpus.
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        fs::create_dir_all(index_dir).context("Failed to create index directory")?;

        let state = SemanticIndexState {
            index: self.index.clone(),
            corpus: self.corpus.clone(),
            config: self.config.clone(),
            metadata: self.metadata.clone(),
        };

        let index_path = index_dir.join("index.json");
        let index_json = serde_json::to_string(&state)?;
        fs::write(index_path, index_json)?;

        let metadata_path = index_dir.join("metadata.json");
        let metadata_json = serde_json::to_string_pretty(&self.metadata)?;
        fs::write(metadata_path, metadata_json)?;

        tracing::info!("Semantic index saved to {:?}", index_dir);
        Ok(())
    }

    /// Load a fitted index from a directory.
    ///
    /// The embedder is only used for queries; the persisted matrix is reused
    /// as is.
    pub fn load(index_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        tracing::info!("Loading semantic index from {:?}", index_dir);

        let index_path = index_dir.join("index.json");
        let index_json = fs::read_to_string(&index_path)
            .context("Failed to read index.json")?;
        let state: SemanticIndexState = serde_json::from_str(&index_json)?;

        if embedder.model_name() != state.metadata.model_name {
            tracing::warn!(
                "Embedder model mismatch: index={}, embedder={}",
                state.metadata.model_name,
                embedder.model_name()
            );
        }
        if embedder.dimension() != state.metadata.dimension {
            anyhow::bail!(
                "Embedder dimension {} does not match index dimension {}",
                embedder.dimension(),
                state.metadata.dimension
            );
        }

        tracing::info!(
            "Semantic index loaded: {} documents",
            state.corpus.len()
        );

        Ok(Self {
            index: state.index,
            corpus: state.corpus,
            embedder,
            config: state.config,
            metadata: state.metadata,
        })
    }

    /// Get index metadata
    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Number of documents in the fitted corpus
    pub fn num_documents(&self) -> usize {
        self.corpus.len()
    }
}

impl Retriever for SemanticRetriever {
    fn query(&self, query: &str) -> Result<Vec<Document>> {
        self.query_top_k(query, self.config.top_k)
    }

    fn name(&self) -> &str {
        "semantic"
    }
}
