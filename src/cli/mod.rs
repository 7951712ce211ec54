//! Command-line interface
//!
//! Provides the offline `index` command (fit and persist retrievers) and
//! the online `query` command (load retrievers, fuse, rerank, print).

use crate::data::{ChunkConfig, MultiFormatLoader, OverlappingChunker};
use crate::embedding::{create_embedder, EmbeddingConfig};
use crate::rag::{RagConfig, RagPipelineBuilder, RagQuery};
use crate::retrieval::{
    Bm25Config, Bm25Retriever, EmbeddingCrossEncoder, RerankConfig, RetrieverReranker,
    SelectionPolicy, SemanticConfig, SemanticRetriever,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Execute the index command
pub async fn index(
    input: String,
    output: String,
    model: String,
    backend: String,
    dimension: usize,
    top_k: usize,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<()> {
    tracing::info!("Starting indexing pipeline");
    tracing::info!("  Input: {}", input);
    tracing::info!("  Output: {}", output);
    tracing::info!("  Backend: {} ({} dims)", backend, dimension);

    let loader = MultiFormatLoader::new();
    let input_path = Path::new(&input);
    let documents = if input_path.is_file() {
        loader.load(input_path)?
    } else if input_path.is_dir() {
        loader.load_directory(input_path)?
    } else {
        anyhow::bail!("Input path does not exist: {}", input);
    };

    let chunker = OverlappingChunker::new(ChunkConfig {
        chunk_size,
        chunk_overlap,
    });
    let corpus = chunker.chunk_corpus(&documents)?;
    tracing::info!(
        "Corpus: {} documents, {} chunks",
        documents.len(),
        corpus.len()
    );

    let output_path = Path::new(&output);

    let bm25 = Bm25Retriever::fit(corpus.clone(), Bm25Config::default().with_top_k(top_k))?;
    bm25.save(&output_path.join("bm25"))?;

    let embedding_config = EmbeddingConfig {
        model_name: model,
        ..Default::default()
    };
    let embedder = create_embedder(&backend, embedding_config, dimension)?;
    let semantic =
        SemanticRetriever::fit(corpus, embedder, SemanticConfig::default().with_top_k(top_k))?;
    semantic.save(&output_path.join("semantic"))?;

    println!("\nIndexing Summary:");
    println!("  Documents loaded: {}", documents.len());
    println!("  Chunks indexed: {}", bm25.num_documents());
    println!("  Output directory: {}", output);

    Ok(())
}

/// Execute the query command
pub async fn query(
    index_dir: String,
    query_text: String,
    model: String,
    backend: String,
    dimension: usize,
    threshold: Option<f32>,
    min_top_k: Option<usize>,
    max_top_k: Option<usize>,
    show_prompt: bool,
) -> Result<()> {
    let index_path = Path::new(&index_dir);

    let embedding_config = EmbeddingConfig {
        model_name: model,
        ..Default::default()
    };
    let embedder = create_embedder(&backend, embedding_config, dimension)?;

    let bm25 = Bm25Retriever::load(&index_path.join("bm25"))
        .context("Failed to load BM25 index")?;
    let semantic = SemanticRetriever::load(&index_path.join("semantic"), embedder.clone())
        .context("Failed to load semantic index")?;

    let policy = SelectionPolicy {
        threshold,
        min_top_k,
        max_top_k,
    };
    let reranker = RetrieverReranker::from_pair(
        Some(Arc::new(bm25)),
        Some(Arc::new(semantic)),
        Arc::new(EmbeddingCrossEncoder::new(embedder)),
        RerankConfig {
            policy,
            drop_duplicates: true,
        },
    );

    // Built once; immutable for the rest of the process.
    let pipeline = RagPipelineBuilder::new()
        .reranker(reranker)
        .config(RagConfig::default().with_lexical_routing(false))
        .build()?;

    let response = pipeline.query(RagQuery::new(&query_text))?;

    println!("{}", response);
    if show_prompt {
        println!("Prompt:\n{}", response.prompt);
    }

    Ok(())
}
