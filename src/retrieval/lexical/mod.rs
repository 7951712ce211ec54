//! Lexical retrieval using BM25
//!
//! Keyword search over a term-count index with smoothed inverse document
//! frequency. The index is built once at fit time and is read-only
//! afterwards.

use crate::data::Document;
use crate::retrieval::{IndexMetadata, Retriever};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

/// Bag-of-words vectorizer with a vocabulary learned from the corpus.
///
/// Tokens are unicode words, lowercased, at least `min_token_len` characters
/// long. Terms absent from the fitted vocabulary are silently dropped at
/// query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    lowercase: bool,
    min_token_len: usize,
    vocabulary: HashMap<String, usize>,
}

impl CountVectorizer {
    /// Create an unfitted vectorizer with default settings
    pub fn new() -> Self {
        Self {
            lowercase: true,
            min_token_len: 2,
            vocabulary: HashMap::new(),
        }
    }

    /// Set the minimum token length
    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    /// Set whether tokens are lowercased
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Split a text into terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter(|word| word.chars().count() >= self.min_token_len)
            .map(|word| {
                if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .collect()
    }

    /// Learn the vocabulary from a corpus of texts
    pub fn fit<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>) {
        self.vocabulary.clear();
        for text in texts {
            for term in self.tokenize(text) {
                let next_id = self.vocabulary.len();
                self.vocabulary.entry(term).or_insert(next_id);
            }
        }
    }

    /// Count occurrences of vocabulary terms in a text
    pub fn transform(&self, text: &str) -> HashMap<usize, u32> {
        let mut counts = HashMap::new();
        for term in self.tokenize(text) {
            if let Some(&term_id) = self.vocabulary.get(&term) {
                *counts.entry(term_id).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Distinct vocabulary term ids present in a text, in ascending id order
    pub fn term_indices(&self, text: &str) -> Vec<usize> {
        let mut indices = BTreeSet::new();
        for term in self.tokenize(text) {
            if let Some(&term_id) = self.vocabulary.get(&term) {
                indices.insert(term_id);
            }
        }
        indices.into_iter().collect()
    }

    /// Number of terms in the fitted vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the BM25 retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Config {
    /// Number of documents to retrieve per query
    pub top_k: usize,
    /// Length normalization parameter
    pub b: f32,
    /// Term-frequency saturation parameter
    pub k1: f32,
    /// Replacement factor for negative idf values, applied to the mean idf
    pub idf_floor_factor: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            top_k: 1,
            b: 0.75,
            k1: 1.6,
            idf_floor_factor: 0.25,
        }
    }
}

impl Bm25Config {
    /// Set the number of documents to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Lexical retriever scoring a fixed corpus against a query with BM25.
///
/// The idf uses the smoothed form `ln((N - df + 0.5) / (df + 0.5) + 1)`;
/// negative values are replaced with `idf_floor_factor` times the mean idf so
/// very common terms keep a small positive weight.
#[derive(Serialize, Deserialize)]
pub struct Bm25Retriever {
    vectorizer: CountVectorizer,
    /// Per term id: (document index, term count) postings
    postings: Vec<Vec<(u32, f32)>>,
    document_lengths: Vec<f32>,
    average_document_length: f32,
    idf: Vec<f32>,
    corpus: Vec<Document>,
    config: Bm25Config,
    metadata: IndexMetadata,
}

impl Bm25Retriever {
    /// Build the index from an ordered corpus
    pub fn fit(corpus: Vec<Document>, config: Bm25Config) -> Result<Self> {
        Self::fit_with_vectorizer(corpus, CountVectorizer::new(), config)
    }

    /// Build the index with a custom vectorizer
    pub fn fit_with_vectorizer(
        corpus: Vec<Document>,
        mut vectorizer: CountVectorizer,
        config: Bm25Config,
    ) -> Result<Self> {
        if corpus.is_empty() {
            anyhow::bail!("Cannot fit BM25 index on an empty corpus");
        }
        if config.top_k == 0 {
            anyhow::bail!("top_k must be positive");
        }

        tracing::info!("Fitting BM25 index: {} documents", corpus.len());

        vectorizer.fit(corpus.iter().map(|doc| doc.text.as_str()));

        let n_documents = corpus.len();
        let n_terms = vectorizer.vocabulary_size();
        let mut postings: Vec<Vec<(u32, f32)>> = vec![Vec::new(); n_terms];
        let mut document_lengths = vec![0.0f32; n_documents];

        for (doc_id, document) in corpus.iter().enumerate() {
            let counts = vectorizer.transform(&document.text);
            document_lengths[doc_id] = counts.values().sum::<u32>() as f32;

            let mut counts: Vec<(usize, u32)> = counts.into_iter().collect();
            counts.sort_unstable_by_key(|&(term_id, _)| term_id);
            for (term_id, count) in counts {
                postings[term_id].push((doc_id as u32, count as f32));
            }
        }

        let average_document_length =
            document_lengths.iter().sum::<f32>() / n_documents as f32;

        // Smoothed idf; document frequency is the posting list length.
        let mut idf: Vec<f32> = postings
            .iter()
            .map(|posting| {
                let df = posting.len() as f32;
                let numerator = n_documents as f32 - df + 0.5;
                let denominator = df + 0.5;
                (numerator / denominator + 1.0).ln()
            })
            .collect();

        // The mean is taken over the raw values, before any replacement.
        if !idf.is_empty() {
            let mean_idf = idf.iter().sum::<f32>() / idf.len() as f32;
            let floor = config.idf_floor_factor * mean_idf;
            for value in idf.iter_mut() {
                if *value < 0.0 {
                    *value = floor;
                }
            }
        }

        let metadata = IndexMetadata::new("bm25", 0, n_documents);

        tracing::info!(
            "BM25 index fitted: {} documents, {} terms",
            n_documents,
            n_terms
        );

        Ok(Self {
            vectorizer,
            postings,
            document_lengths,
            average_document_length,
            idf,
            corpus,
            config,
            metadata,
        })
    }

    /// Retrieve the `top_k` documents most relevant to the query.
    ///
    /// Documents containing none of the query terms are not returned, so the
    /// result can be shorter than `top_k`. Ties are broken by corpus order.
    pub fn query_top_k(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let query_terms = self.vectorizer.term_indices(query);

        let mut scores: HashMap<u32, f32> = HashMap::new();
        for term_id in query_terms {
            let idf = self.idf[term_id];
            for &(doc_id, term_count) in &self.postings[term_id] {
                let doc_length = self.document_lengths[doc_id as usize];
                let numerator = term_count * (self.config.k1 + 1.0);
                let denominator = term_count
                    + self.config.k1
                        * (1.0 - self.config.b
                            + self.config.b * doc_length / self.average_document_length);
                *scores.entry(doc_id).or_insert(0.0) += idf * numerator / denominator;
            }
        }

        let mut ranked: Vec<(u32, f32)> = scores.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_k);

        Ok(ranked
            .into_iter()
            .map(|(doc_id, _)| self.corpus[doc_id as usize].clone())
            .collect())
    }

    /// Save the fitted index to a directory
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        fs::create_dir_all(index_dir).context("Failed to create index directory")?;

        let index_path = index_dir.join("index.json");
        let index_json = serde_json::to_string(self)?;
        fs::write(index_path, index_json)?;

        let metadata_path = index_dir.join("metadata.json");
        let metadata_json = serde_json::to_string_pretty(&self.metadata)?;
        fs::write(metadata_path, metadata_json)?;

        tracing::info!("BM25 index saved to {:?}", index_dir);
        Ok(())
    }

    /// Load a fitted index from a directory
    pub fn load(index_dir: &Path) -> Result<Self> {
        tracing::info!("Loading BM25 index from {:?}", index_dir);

        let index_path = index_dir.join("index.json");
        let index_json = fs::read_to_string(&index_path)
            .context("Failed to read index.json")?;
        let retriever: Self = serde_json::from_str(&index_json)?;

        tracing::info!(
            "BM25 index loaded: {} documents",
            retriever.corpus.len()
        );
        Ok(retriever)
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

impl Retriever for Bm25Retriever {
    fn query(&self, query: &str) -> Result<Vec<Document>> {
        self.query_top_k(query, self.config.top_k)
    }

    fn supports_lexical_query(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corpus_from_texts;
    use tempfile::tempdir;

    fn sample_corpus() -> Vec<Document> {
        vec![
            Document::new("s1", "xxx"),
            Document::new("s2", "yyy"),
        ]
    }

    #[test]
    fn test_vectorizer_tokenize() {
        let vectorizer = CountVectorizer::new();
        let tokens = vectorizer.tokenize("Ridge regression, a linear-model!");

        assert_eq!(tokens, vec!["ridge", "regression", "linear", "model"]);
    }

    #[test]
    fn test_vectorizer_drops_short_tokens() {
        let vectorizer = CountVectorizer::new();
        let tokens = vectorizer.tokenize("a of fit x");

        assert_eq!(tokens, vec!["of", "fit"]);
    }

    #[test]
    fn test_vectorizer_transform_counts() {
        let mut vectorizer = CountVectorizer::new();
        vectorizer.fit(["apple banana apple"]);

        let counts = vectorizer.transform("apple apple cherry");

        assert_eq!(counts.len(), 1);
        assert_eq!(counts.values().copied().max(), Some(2));
    }

    #[test]
    fn test_bm25_query_returns_matching_document() {
        let retriever =
            Bm25Retriever::fit(sample_corpus(), Bm25Config::default().with_top_k(1)).unwrap();

        let results = retriever.query("xxx").unwrap();

        assert_eq!(results, vec![Document::new("s1", "xxx")]);
    }

    #[test]
    fn test_bm25_determinism() {
        let corpus = corpus_from_texts(["rust systems language", "python data", "rust tooling"]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(3)).unwrap();

        let first = retriever.query("rust language").unwrap();
        let second = retriever.query("rust language").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_bm25_returns_fewer_than_top_k_on_term_mismatch() {
        let corpus = corpus_from_texts(["xxx", "yyy", "zzz", "aaa"]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(10)).unwrap();

        let results = retriever.query("xxx").unwrap();

        // Only one document contains the query term.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "xxx");
    }

    #[test]
    fn test_bm25_tie_break_by_corpus_order() {
        let corpus = vec![
            Document::new("first", "shared term"),
            Document::new("second", "shared term"),
        ];
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(2)).unwrap();

        let results = retriever.query("shared").unwrap();

        assert_eq!(results[0].source, "first");
        assert_eq!(results[1].source, "second");
    }

    #[test]
    fn test_bm25_rare_term_outranks_common_term() {
        let corpus = corpus_from_texts([
            "kernel estimator bandwidth",
            "kernel ridge regression",
            "kernel pipeline",
        ]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(3)).unwrap();

        // "kernel" appears everywhere; "bandwidth" only in the first document.
        let results = retriever.query("kernel bandwidth").unwrap();

        assert_eq!(results[0].text, "kernel estimator bandwidth");
    }

    #[test]
    fn test_bm25_term_frequency_raises_score() {
        let corpus = corpus_from_texts(["apple banana", "apple apple"]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(2)).unwrap();

        let results = retriever.query("apple").unwrap();

        assert_eq!(results[0].text, "apple apple");
    }

    #[test]
    fn test_bm25_unknown_query_terms_are_dropped() {
        let retriever =
            Bm25Retriever::fit(sample_corpus(), Bm25Config::default().with_top_k(2)).unwrap();

        let results = retriever.query("unseen words only").unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_bm25_empty_corpus_fails() {
        let result = Bm25Retriever::fit(Vec::new(), Bm25Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_bm25_zero_top_k_fails() {
        let result = Bm25Retriever::fit(sample_corpus(), Bm25Config::default().with_top_k(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_bm25_idf_is_positive() {
        let corpus = corpus_from_texts(["common word here", "common word there", "common word"]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(3)).unwrap();

        assert!(retriever.idf.iter().all(|&value| value > 0.0));
    }

    #[test]
    fn test_bm25_save_load() {
        let corpus = corpus_from_texts(["rust systems language", "python data science"]);
        let retriever =
            Bm25Retriever::fit(corpus, Bm25Config::default().with_top_k(2)).unwrap();

        let temp_dir = tempdir().unwrap();
        retriever.save(temp_dir.path()).unwrap();

        let loaded = Bm25Retriever::load(temp_dir.path()).unwrap();

        assert_eq!(loaded.metadata().num_documents, 2);
        assert_eq!(
            loaded.query("rust").unwrap(),
            retriever.query("rust").unwrap()
        );
    }
}
