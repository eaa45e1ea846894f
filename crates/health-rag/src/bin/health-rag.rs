//! Health RAG binary
//!
//! Run with: cargo run -p health-rag -- serve

use clap::{Parser, Subcommand};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_rag::{
    config::{RagConfig, PRINT_MODE},
    ingestion::{DailyLoader, SummaryUploader},
    pipeline::build_index,
    providers::{build_embedder, build_llm, build_vector_store},
    server::{GatewayServer, GatewayState, QaServer, QaState},
    FlatIndex,
};

/// Question answering over health and fitness records
#[derive(Parser)]
#[command(name = "health-rag", version, about)]
struct Cli {
    /// Path to a TOML configuration file (falls back to HEALTH_RAG_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index in the background and serve /ask
    Serve,

    /// Serve /ingest and /query against the vector store
    Gateway,

    /// Normalize, embed and write the index file, then exit
    BuildIndex {
        /// Override the configured index path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Post per-user daily summaries to a running gateway's /ingest
    IngestDaily {
        /// Directory of record-array exports (defaults to <data_dir>/<daily.family>)
        dir: Option<PathBuf>,

        /// Print summaries instead of sending them (same as API_URL=PRINT_MODE)
        #[arg(long)]
        dry_run: bool,
    },

    /// Report the shape of a written index file
    InspectIndex {
        /// Index file to read
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "health_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = load_config(cli.config.as_deref())?;
            let embedder = build_embedder(&config);
            let llm = build_llm(&config)?;

            let state = QaState::new(config.clone());
            state.spawn_index_build(embedder, llm);

            QaServer::new(config, state).start().await?;
        }
        Commands::Gateway => {
            let config = load_config(cli.config.as_deref())?;
            let store = build_vector_store(&config)?;
            let embedder = build_embedder(&config);

            let state = GatewayState::new(&config, store, embedder);
            GatewayServer::new(config, state).start().await?;
        }
        Commands::BuildIndex { output } => {
            let config = load_config(cli.config.as_deref())?;
            let embedder = build_embedder(&config);
            let index = build_index(&config, embedder.as_ref()).await?;

            let path = output.unwrap_or_else(|| config.vector_db.index_path.clone());
            index.save(&path)?;

            println!(
                "Indexed {} chunks (dimension {}) into {}",
                index.len(),
                index.dimension(),
                path.display()
            );
        }
        Commands::IngestDaily { dir, dry_run } => {
            let mut config = load_config(cli.config.as_deref())?;
            if dry_run {
                config.daily.api_url = PRINT_MODE.to_string();
            }

            let loader = match dir {
                Some(dir) => DailyLoader::new(dir),
                None => DailyLoader::from_config(&config),
            };
            if !loader.dir().exists() {
                anyhow::bail!("Data directory does not exist: {}", loader.dir().display());
            }
            tracing::info!("Using data directory: {}", loader.dir().display());

            let summaries = loader.summaries()?;
            let uploader = SummaryUploader::from_config(&config.daily)?;
            if !uploader.is_dry_run() {
                tracing::info!("Posting to {}", config.daily.api_url);
            }
            let report = uploader.upload(&summaries).await;

            println!(
                "Sent {} of {} daily summaries in {} batches ({} failed)",
                report.sent,
                summaries.len(),
                report.batches,
                report.failed
            );
        }
        Commands::InspectIndex { path } => inspect_index(&path)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RagConfig> {
    let config = RagConfig::load(path)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data directory: {}", config.data.data_dir.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM backend: {:?}", config.llm.backend);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    Ok(config)
}

fn inspect_index(path: &Path) -> anyhow::Result<()> {
    let index = FlatIndex::load(path)?;

    let users: BTreeSet<&str> = index
        .chunks()
        .iter()
        .map(|c| c.metadata.user_id.as_str())
        .collect();

    let mut levels: BTreeMap<&str, usize> = BTreeMap::new();
    for chunk in index.chunks() {
        *levels.entry(chunk.metadata.fitness_level.as_str()).or_default() += 1;
    }

    println!("Index: {}", path.display());
    println!("  Dimension: {}", index.dimension());
    println!("  Chunks: {}", index.len());
    println!("  Users: {}", users.len());
    println!("  Fitness levels:");
    for (level, count) in levels {
        println!("    {}: {}", level, count);
    }

    Ok(())
}
