//! # docq
//!
//! A hybrid retrieval and reranking engine for answering questions about a
//! software library's documentation.
//!
//! ## Overview
//!
//! docq indexes a corpus of documentation chunks for both lexical and
//! semantic search, merges the results of multiple retrievers, rescores the
//! merged candidates with a cross-encoder, and hands the selected context to
//! a prompting layer:
//!
//! - Corpus loading from text, markdown, and JSONL chunk dumps
//! - BM25 lexical retrieval with smoothed inverse document frequency
//! - Exact inner-product semantic retrieval over normalized embeddings
//! - Cross-encoder fusion with threshold / min / max selection policy
//! - Prompt assembly for a downstream language model
//! - Offline indexing and online querying through a CLI
//!
//! ## Architecture
//!
//! The crate is organized into modular components:
//!
//! - `data` - Document loading and chunking
//! - `embedding` - Embedding trait and model-free backends
//! - `retrieval` - Lexical, semantic, and reranking fusion retrieval
//! - `rag` - Prompt assembly and the query pipeline
//! - `cli` - Command-line interface

// Core modules
pub mod cli;
pub mod data;
pub mod embedding;
pub mod rag;
pub mod retrieval;

// Re-export commonly used types
pub use anyhow::{Error, Result};
