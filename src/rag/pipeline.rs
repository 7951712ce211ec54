//! Pipeline orchestration
//!
//! `RagPipeline` is the application context: it is built once at startup
//! from fitted retrievers, stays immutable, and is passed by reference to
//! request handlers. Each `query` call is self-contained, so one pipeline
//! can serve concurrent queries.

use anyhow::{Context, Result};
use std::time::Instant;

use crate::rag::context::ContextBuilder;
use crate::rag::generator::{Generator, SamplingParams};
use crate::rag::query::{RagQuery, RagResponse, Source};
use crate::retrieval::RetrieverReranker;

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Maximum characters of retrieved context in the prompt
    pub max_context_chars: usize,
    /// Prompt template to use
    pub template_name: String,
    /// Extract keywords for lexical retrievers before querying.
    ///
    /// Only takes effect when the fused retriever reports lexical support
    /// and a generator is attached to do the extraction.
    pub lexical_routing: bool,
    /// Sampling parameters for generation
    pub sampling_params: SamplingParams,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 4000,
            template_name: "default".to_string(),
            lexical_routing: true,
            sampling_params: SamplingParams::default(),
        }
    }
}

impl RagConfig {
    /// Set the maximum context size
    pub fn with_max_context_chars(mut self, chars: usize) -> Self {
        self.max_context_chars = chars;
        self
    }

    /// Set the template name
    pub fn with_template(mut self, template: &str) -> Self {
        self.template_name = template.to_string();
        self
    }

    /// Enable or disable keyword routing
    pub fn with_lexical_routing(mut self, enabled: bool) -> Self {
        self.lexical_routing = enabled;
        self
    }
}

/// Pipeline for documentation question-answering.
///
/// Orchestrates the full workflow: retrieve and rerank context, assemble
/// the prompt, and generate an answer when a generator is attached.
pub struct RagPipeline {
    reranker: RetrieverReranker,
    generator: Option<Box<dyn Generator>>,
    context_builder: ContextBuilder,
    config: RagConfig,
}

impl RagPipeline {
    /// Create a new pipeline (use [`RagPipelineBuilder`] instead)
    pub fn new(
        reranker: RetrieverReranker,
        generator: Option<Box<dyn Generator>>,
        config: RagConfig,
    ) -> Self {
        Self {
            reranker,
            generator,
            context_builder: ContextBuilder::new(),
            config,
        }
    }

    /// Execute a query
    pub fn query(&self, query: RagQuery) -> Result<RagResponse> {
        let policy = query
            .policy
            .as_ref()
            .unwrap_or(&self.reranker.config().policy);

        let retrieval_start = Instant::now();

        let documents = match self.keyword_query(&query.query)? {
            Some(keywords) => {
                tracing::info!("Routing keywords to lexical retrievers: {}", keywords);
                self.reranker
                    .query_routed(&query.query, Some(&keywords), None, policy)?
            }
            None => self.reranker.query_with(&query.query, policy)?,
        };

        let retrieval_time_ms = retrieval_start.elapsed().as_millis() as u64;
        tracing::info!(
            "Retrieved {} documents in {}ms",
            documents.len(),
            retrieval_time_ms
        );

        let prompt = self.context_builder.build_prompt(
            &query.query,
            &documents,
            self.config.max_context_chars,
            &self.config.template_name,
            query.include_citations,
        );

        let generation_start = Instant::now();
        let answer = match &self.generator {
            Some(generator) => Some(
                generator
                    .generate(&prompt, &self.config.sampling_params)
                    .context("Failed to generate answer")?,
            ),
            None => None,
        };
        let generation_time_ms = generation_start.elapsed().as_millis() as u64;

        let sources: Vec<Source> = documents
            .iter()
            .map(|document| Source {
                source: document.source.clone(),
                snippet: truncate_snippet(&document.text, 200),
            })
            .collect();

        Ok(RagResponse {
            answer,
            sources,
            prompt,
            retrieval_time_ms,
            generation_time_ms,
        })
    }

    /// Extract keywords for lexical routing, when applicable
    fn keyword_query(&self, query: &str) -> Result<Option<String>> {
        if !self.config.lexical_routing || !self.reranker.supports_lexical_query() {
            return Ok(None);
        }
        let Some(generator) = &self.generator else {
            return Ok(None);
        };

        let prompt = self.context_builder.format_keyword_prompt(query);
        let keywords = generator
            .generate(&prompt, &self.config.sampling_params)
            .context("Failed to extract keywords")?;
        Ok(Some(keywords.trim().to_string()))
    }

    /// Get the fused retriever
    pub fn reranker(&self) -> &RetrieverReranker {
        &self.reranker
    }

    /// Get the config
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

/// Builder for [`RagPipeline`]
pub struct RagPipelineBuilder {
    reranker: Option<RetrieverReranker>,
    generator: Option<Box<dyn Generator>>,
    config: RagConfig,
}

impl RagPipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            reranker: None,
            generator: None,
            config: RagConfig::default(),
        }
    }

    /// Set the fused retriever (required)
    pub fn reranker(mut self, reranker: RetrieverReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the answer generator (optional)
    pub fn generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the config
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<RagPipeline> {
        let reranker = self
            .reranker
            .context("A fused retriever is required to build RagPipeline")?;

        Ok(RagPipeline::new(reranker, self.generator, self.config))
    }
}

impl Default for RagPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a text snippet to max length, preserving word boundaries
fn truncate_snippet(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let truncated = &text[..max_len];
    if let Some(last_space) = truncated.rfind(' ') {
        format!("{}...", &truncated[..last_space])
    } else {
        format!("{}...", truncated)
    }
}
