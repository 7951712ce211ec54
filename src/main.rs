use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docq::cli;

#[derive(Parser)]
#[command(name = "docq")]
#[command(about = "docq - hybrid retrieval and reranking for documentation question-answering", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a corpus, fit the retrievers, and persist the indexes
    Index {
        /// Input directory or file (txt, md, jsonl)
        #[arg(short, long)]
        input: String,

        /// Output directory for the fitted indexes
        #[arg(short, long)]
        output: String,

        /// Embedding model name
        #[arg(short, long, default_value = "token-embedder")]
        model: String,

        /// Embedding backend: token or mock
        #[arg(short, long, default_value = "token")]
        backend: String,

        /// Embedding dimension
        #[arg(long, default_value = "384")]
        dimension: usize,

        /// Number of candidates each retriever returns per query
        #[arg(short, long, default_value = "10")]
        top_k: usize,

        /// Chunk size in characters
        #[arg(long, default_value = "512")]
        chunk_size: usize,

        /// Chunk overlap in characters
        #[arg(long, default_value = "50")]
        chunk_overlap: usize,
    },

    /// Query fitted indexes through the reranking fusion engine
    Query {
        /// Index directory produced by the index command
        #[arg(short, long)]
        index: String,

        /// Query text
        #[arg(short, long)]
        query: String,

        /// Embedding model name (must match the fitted index)
        #[arg(short, long, default_value = "token-embedder")]
        model: String,

        /// Embedding backend: token or mock
        #[arg(short, long, default_value = "token")]
        backend: String,

        /// Embedding dimension (must match the fitted index)
        #[arg(long, default_value = "384")]
        dimension: usize,

        /// Keep only candidates scoring strictly above this value
        #[arg(long)]
        threshold: Option<f32>,

        /// Minimum number of documents to return
        #[arg(long)]
        min_top_k: Option<usize>,

        /// Maximum number of documents to return
        #[arg(long)]
        max_top_k: Option<usize>,

        /// Print the assembled prompt
        #[arg(long)]
        show_prompt: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docq=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            input,
            output,
            model,
            backend,
            dimension,
            top_k,
            chunk_size,
            chunk_overlap,
        } => {
            cli::index(
                input,
                output,
                model,
                backend,
                dimension,
                top_k,
                chunk_size,
                chunk_overlap,
            )
            .await?;
        }

        Commands::Query {
            index,
            query,
            model,
            backend,
            dimension,
            threshold,
            min_top_k,
            max_top_k,
            show_prompt,
        } => {
            cli::query(
                index,
                query,
                model,
                backend,
                dimension,
                threshold,
                min_top_k,
                max_top_k,
                show_prompt,
            )
            .await?;
        }
    }

    Ok(())
}
