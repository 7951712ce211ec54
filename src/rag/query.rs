//! Pipeline query and response types

use crate::retrieval::SelectionPolicy;
use serde::{Deserialize, Serialize};

/// Query input for the pipeline
#[derive(Debug, Clone)]
pub struct RagQuery {
    /// The user's question
    pub query: String,
    /// Per-query override of the fusion selection policy
    pub policy: Option<SelectionPolicy>,
    /// Whether to include citation instructions in the prompt
    pub include_citations: bool,
}

impl RagQuery {
    /// Create a new query
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            policy: None,
            include_citations: true,
        }
    }

    /// Override the selection policy for this query
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set whether to include citations
    pub fn with_citations(mut self, include: bool) -> Self {
        self.include_citations = include;
        self
    }
}

/// Source document reference in a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Identifier or URL of the origin
    pub source: String,
    /// Text snippet from the document
    pub snippet: String,
}

/// Response from the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Generated answer; absent when no generator is attached
    pub answer: Option<String>,
    /// Source documents selected as context, best first
    pub sources: Vec<Source>,
    /// The prompt assembled for the language model
    pub prompt: String,
    /// Retrieval time in milliseconds
    pub retrieval_time_ms: u64,
    /// Generation time in milliseconds
    pub generation_time_ms: u64,
}

impl std::fmt::Display for RagResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(answer) = &self.answer {
            writeln!(f, "Answer: {}", answer)?;
        }
        writeln!(f, "\nSources ({}):", self.sources.len())?;
        for (i, source) in self.sources.iter().enumerate() {
            writeln!(f, "  [{}] {}", i + 1, source.source)?;
        }
        writeln!(
            f,
            "\nTiming: retrieval={}ms, generation={}ms",
            self.retrieval_time_ms, self.generation_time_ms
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rag_query_builder() {
        let query = RagQuery::new("What is Ridge?")
            .with_policy(SelectionPolicy::default().with_max_top_k(3))
            .with_citations(false);

        assert_eq!(query.query, "What is Ridge?");
        assert_eq!(query.policy.unwrap().max_top_k, Some(3));
        assert!(!query.include_citations);
    }

    #[test]
    fn test_rag_response_display() {
        let response = RagResponse {
            answer: Some("Test answer".to_string()),
            sources: vec![Source {
                source: "api/ridge".to_string(),
                snippet: "Ridge docs".to_string(),
            }],
            prompt: "prompt".to_string(),
            retrieval_time_ms: 10,
            generation_time_ms: 500,
        };

        let display = format!("{}", response);
        assert!(display.contains("Test answer"));
        assert!(display.contains("api/ridge"));
    }
}
