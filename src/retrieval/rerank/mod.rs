//! Reranking fusion of multiple retrievers
//!
//! Fans a query out to every registered retriever, merges and deduplicates
//! the candidates, rescores each (query, candidate) pair with a
//! cross-encoder, and selects the final set under threshold / min / max
//! constraints. The engine holds no state between queries; a fitted set of
//! retrievers can serve concurrent queries through it.

use crate::data::Document;
use crate::embedding::{cosine_similarity, Embedder};
use crate::retrieval::Retriever;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Trait for cross-encoder scoring models.
///
/// `score` returns one relevance score per (query, text) pair, in input
/// order.
pub trait CrossEncoder: Send + Sync {
    /// Score (query, text) pairs for relevance
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Fallback pair scorer that approximates cross-encoder relevance with the
/// cosine similarity of bi-encoder embeddings.
///
/// Less accurate than a jointly-encoded model, but runs without any ML
/// runtime.
pub struct EmbeddingCrossEncoder {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingCrossEncoder {
    /// Create a new embedding-based pair scorer
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

impl CrossEncoder for EmbeddingCrossEncoder {
    fn score(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(pairs.len());
        for &(query, text) in pairs {
            let query_embedding = self.embedder.embed(query)?;
            let text_embedding = self.embedder.embed(text)?;
            scores.push(cosine_similarity(&query_embedding, &text_embedding));
        }
        Ok(scores)
    }

    fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

/// Selection policy applied to cross-encoder scores.
///
/// `threshold` is the primary relevance gate; `min_top_k` guarantees the
/// prompting layer always receives some context even when nothing clears the
/// bar, and `max_top_k` bounds the token cost of the downstream prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Keep only candidates scoring strictly above this value
    pub threshold: Option<f32>,
    /// Minimum number of documents to return, overriding the threshold
    pub min_top_k: Option<usize>,
    /// Maximum number of documents to return
    pub max_top_k: Option<usize>,
}

impl SelectionPolicy {
    /// Set the score threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the minimum result count
    pub fn with_min_top_k(mut self, min_top_k: usize) -> Self {
        self.min_top_k = Some(min_top_k);
        self
    }

    /// Set the maximum result count
    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = Some(max_top_k);
        self
    }
}

/// Configuration for the reranking fusion engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Default selection policy; can be overridden per query
    pub policy: SelectionPolicy,
    /// Whether to collapse candidates with identical text content
    pub drop_duplicates: bool,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::default(),
            drop_duplicates: true,
        }
    }
}

/// Fusion engine combining several retrievers behind a cross-encoder.
///
/// Candidate lists are concatenated in retriever registration order, each
/// retriever's own order preserved; ties in the cross-encoder scores keep
/// that order too.
pub struct RetrieverReranker {
    retrievers: Vec<Arc<dyn Retriever>>,
    cross_encoder: Arc<dyn CrossEncoder>,
    config: RerankConfig,
}

impl RetrieverReranker {
    /// Create a fusion engine over an arbitrary list of retrievers
    pub fn new(
        retrievers: Vec<Arc<dyn Retriever>>,
        cross_encoder: Arc<dyn CrossEncoder>,
        config: RerankConfig,
    ) -> Self {
        Self {
            retrievers,
            cross_encoder,
            config,
        }
    }

    /// Convenience constructor for the common lexical + semantic pair.
    ///
    /// Either side may be absent; present retrievers are registered in
    /// lexical-first order.
    pub fn from_pair(
        lexical_retriever: Option<Arc<dyn Retriever>>,
        semantic_retriever: Option<Arc<dyn Retriever>>,
        cross_encoder: Arc<dyn CrossEncoder>,
        config: RerankConfig,
    ) -> Self {
        let retrievers = [lexical_retriever, semantic_retriever]
            .into_iter()
            .flatten()
            .collect();
        Self::new(retrievers, cross_encoder, config)
    }

    /// Retrieve, deduplicate, rescore, and select documents for a query
    /// using the configured policy
    pub fn query(&self, query: &str) -> Result<Vec<Document>> {
        self.query_with(query, &self.config.policy)
    }

    /// Like [`query`](Self::query), with a per-query selection policy
    pub fn query_with(&self, query: &str, policy: &SelectionPolicy) -> Result<Vec<Document>> {
        self.query_routed(query, None, None, policy)
    }

    /// Retrieve with distinct query strings per retriever kind.
    ///
    /// Retrievers reporting lexical support receive `lexical_query`, the
    /// others `semantic_query`; either falls back to `query` when absent.
    /// Cross-encoder pairs always score against the full `query`.
    pub fn query_routed(
        &self,
        query: &str,
        lexical_query: Option<&str>,
        semantic_query: Option<&str>,
        policy: &SelectionPolicy,
    ) -> Result<Vec<Document>> {
        let lexical_query = lexical_query.unwrap_or(query);
        let semantic_query = semantic_query.unwrap_or(query);

        let mut candidates: Vec<Document> = Vec::new();
        for retriever in &self.retrievers {
            let routed = if retriever.supports_lexical_query() {
                lexical_query
            } else {
                semantic_query
            };
            let mut results = retriever.query(routed)?;
            tracing::debug!(
                "Retriever '{}' returned {} candidates",
                retriever.name(),
                results.len()
            );
            candidates.append(&mut results);
        }

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        if self.config.drop_duplicates {
            let mut seen = HashSet::new();
            candidates.retain(|candidate| seen.insert(candidate.text.clone()));
        }

        let pairs: Vec<(&str, &str)> = candidates
            .iter()
            .map(|candidate| (query, candidate.text.as_str()))
            .collect();
        let scores = self.cross_encoder.score(&pairs)?;
        if scores.len() != candidates.len() {
            anyhow::bail!(
                "Cross-encoder returned {} scores for {} pairs",
                scores.len(),
                candidates.len()
            );
        }

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut selected: Vec<usize> = match policy.threshold {
            Some(threshold) => indices
                .iter()
                .copied()
                .filter(|&idx| scores[idx] > threshold)
                .collect(),
            None => indices.clone(),
        };

        if let Some(min_top_k) = policy.min_top_k {
            if selected.len() < min_top_k {
                selected = indices.iter().copied().take(min_top_k).collect();
            } else if let Some(max_top_k) = policy.max_top_k {
                if selected.len() > max_top_k {
                    selected.truncate(max_top_k);
                }
            }
        } else if let Some(max_top_k) = policy.max_top_k {
            if selected.len() > max_top_k {
                selected.truncate(max_top_k);
            }
        }

        Ok(selected
            .into_iter()
            .map(|idx| candidates[idx].clone())
            .collect())
    }

    /// Get the engine configuration
    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    /// Whether any registered retriever benefits from a keyword-only query
    pub fn supports_lexical_query(&self) -> bool {
        self.retrievers
            .iter()
            .any(|retriever| retriever.supports_lexical_query())
    }

    /// Names of the registered retrievers, in registration order
    pub fn retriever_names(&self) -> Vec<&str> {
        self.retrievers.iter().map(|r| r.name()).collect()
    }
}
