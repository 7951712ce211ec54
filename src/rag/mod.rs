//! Question-answering pipeline
//!
//! Assembles retrieved context into prompts and coordinates retrieval and
//! answer generation for a query.

pub mod context;
pub mod generator;
pub mod pipeline;
pub mod query;

// Re-exports
pub use context::{ContextBuilder, PromptTemplates};
pub use generator::Generator;
pub use pipeline::{RagConfig, RagPipeline, RagPipelineBuilder};
pub use query::{RagQuery, RagResponse, Source};
