//! ARGO query API.
//!
//! Loads the JSON summary corpus at startup and serves free-text question
//! answering (keyword retrieval + hosted chat model) and semantic search
//! over the per-file vector indices.

mod context;
mod corpus;
mod score;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use llm_client::{ChatClient, ChatConfig, EmbeddingClient, EmbeddingConfig};
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "query-api")]
#[command(about = "Question answering and semantic search over ARGO summary records")]
struct Args {
    /// Root of the JSON summary tree
    #[arg(long, default_value = "Datasetjson")]
    json_root: PathBuf,

    /// Root of the vector index tree
    #[arg(long, default_value = "VectorIndex")]
    index_root: PathBuf,

    /// Port to serve on
    #[arg(long, env = "QUERY_PORT", default_value = "8090")]
    port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting query API");

    if !args.json_root.exists() {
        anyhow::bail!(
            "Summary root {} does not exist; run the summarizer first",
            args.json_root.display()
        );
    }

    // Missing API credentials are unrecoverable configuration.
    let chat = ChatClient::new(ChatConfig::from_env()?)?;
    let embeddings = EmbeddingClient::new(EmbeddingConfig::from_env()?)?;

    let corpus = corpus::load_corpus(&args.json_root)?;
    if corpus.is_empty() {
        anyhow::bail!(
            "No summary records under {}; run the summarizer first",
            args.json_root.display()
        );
    }

    let state = Arc::new(ServerState {
        corpus,
        chat,
        embeddings,
        json_root: args.json_root,
        index_root: args.index_root,
    });

    server::run_server(state, args.port).await
}
