//! Model-free embedding backends
//!
//! Sentence-transformer style models are injected by the application; these
//! backends let the pipeline run end-to-end without any ML runtime.

use crate::embedding::{Embedder, Embedding, EmbeddingConfig};
use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Mock embedder for testing (generates random but deterministic embeddings)
pub struct MockEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        Self { config, dimension }
    }

    /// Generate a deterministic embedding based on text hash
    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        let mut state = seed;

        for _ in 0..self.dimension {
            // Simple LCG (Linear Congruential Generator)
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            let value = ((state / 65536) % 10000) as f32 / 10000.0 - 0.5;
            embedding.push(value);
        }

        embedding
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|&text| self.generate_embedding(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Token-based embedder (hashed bag of tokens).
///
/// A fallback embedder that doesn't require ML models: overlapping token sets
/// land in overlapping buckets, so related texts score a positive cosine
/// similarity.
pub struct TokenEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
}

impl TokenEmbedder {
    /// Create a new token-based embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        Self { config, dimension }
    }

    /// Generate embeddings based on token hashing
    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];

        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|s| !s.is_empty())
            .collect();

        if tokens.is_empty() {
            return embedding;
        }

        // Hash each token to a position in the embedding
        for token in &tokens {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dimension;
            embedding[idx] += 1.0;
        }

        // Term-frequency scaling
        let total_tokens = tokens.len() as f32;
        for val in embedding.iter_mut() {
            *val /= total_tokens;
        }

        embedding
    }
}

impl Embedder for TokenEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|&text| self.generate_embedding(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Create an embedder based on backend name
pub fn create_embedder(
    backend: &str,
    config: EmbeddingConfig,
    dimension: usize,
) -> Result<Arc<dyn Embedder>> {
    match backend {
        "mock" => Ok(Arc::new(MockEmbedder::new(config, dimension))),
        "token" => Ok(Arc::new(TokenEmbedder::new(config, dimension))),
        _ => {
            tracing::warn!("Unknown backend '{}', using token-based embedder", backend);
            Ok(Arc::new(TokenEmbedder::new(config, dimension)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{cosine_similarity, normalize_embedding};

    #[test]
    fn test_mock_embedder() {
        let config = EmbeddingConfig {
            model_name: "test-model".to_string(),
            ..Default::default()
        };
        let embedder = MockEmbedder::new(config, 128);

        let text = "Hello, world!";
        let emb = embedder.embed(text).unwrap();

        assert_eq!(emb.len(), 128);

        // Should be deterministic
        let emb2 = embedder.embed(text).unwrap();
        assert_eq!(emb, emb2);

        // Different text should give different embedding
        let emb3 = embedder.embed("Different text").unwrap();
        assert_ne!(emb, emb3);
    }

    #[test]
    fn test_token_embedder_similarity() {
        let config = EmbeddingConfig {
            model_name: "token-model".to_string(),
            ..Default::default()
        };
        let embedder = TokenEmbedder::new(config, 256);

        let mut emb = embedder.embed("The quick brown fox jumps over the lazy dog").unwrap();
        let mut emb2 = embedder.embed("The quick brown fox").unwrap();
        normalize_embedding(&mut emb);
        normalize_embedding(&mut emb2);

        assert_eq!(emb.len(), 256);
        // Overlapping token sets should give some similarity
        assert!(cosine_similarity(&emb, &emb2) > 0.1);
    }

    #[test]
    fn test_embedder_batch() {
        let config = EmbeddingConfig::default();
        let embedder = MockEmbedder::new(config, 64);

        let texts = vec!["text1", "text2", "text3"];
        let embeddings = embedder.embed_batch(&texts).unwrap();

        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[0].len(), 64);
    }

    #[test]
    fn test_create_embedder_falls_back_to_token() {
        let embedder = create_embedder("unknown", EmbeddingConfig::default(), 32).unwrap();
        assert_eq!(embedder.dimension(), 32);
    }
}
