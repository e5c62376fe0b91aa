mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::RagbotConfig;
use ragbot_agent::AgentRunner;
use ragbot_memory::{Indexer, RetrievalService, VectorIndex};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragbot", about = "Ragbot: retrieval-augmented chat over your documents")]
struct Cli {
    /// Path to config file (defaults to ./ragbot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge index from a directory of documents
    Index {
        /// Document directory (overrides config)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Index file to write (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Print the knowledge retrieved for a query
    Retrieve {
        query: String,
        /// Number of chunks (overrides config)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Answer a single message
    Ask { message: String },
    /// Answer messages read line by line from stdin
    Chat,
    /// Show the manifest of the knowledge index
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = RagbotConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Index {
            source,
            output,
            chunk_size,
            chunk_overlap,
        } => {
            let source = source.unwrap_or(config.index.source_dir);
            let output = output.unwrap_or(config.index.path);
            let chunk_size = chunk_size.unwrap_or(config.index.chunk_size);
            let chunk_overlap = chunk_overlap.unwrap_or(config.index.chunk_overlap);

            let embedder = config.embedding.build_provider()?;
            info!(
                source = %source.display(),
                output = %output.display(),
                model = %embedder.model_id(),
                chunk_size,
                chunk_overlap,
                "Building knowledge index"
            );

            let stats = Indexer::new(embedder)
                .with_batch_size(config.embedding.batch_size)
                .build_to(&source, &output, chunk_size, chunk_overlap)
                .await
                .context("Index build failed")?;

            println!(
                "Indexed {} document(s) into {} chunk(s) ({} dims) at {}",
                stats.documents,
                stats.chunks,
                stats.dimension,
                stats.path.display()
            );
        }
        Commands::Retrieve { query, k } => {
            let embedder = config.embedding.build_provider()?;
            let retrieval = RetrievalService::open(&config.index.path, embedder).await;
            let k = k.unwrap_or(config.model.retrieval_top_k);
            let knowledge = retrieval.retrieve(&query, k).await?;
            println!("{knowledge}");
        }
        Commands::Ask { message } => {
            let runner = build_runner(config).await?;
            let cancel = CancellationToken::new();
            let outcome = tokio::select! {
                outcome = runner.run_with_cancel(&message, &cancel) => outcome,
                _ = tokio::signal::ctrl_c() => {
                    cancel.cancel();
                    anyhow::bail!("Interrupted");
                }
            };
            println!("{}", outcome.text);
        }
        Commands::Chat => {
            let runner = build_runner(config).await?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();

            while let Some(line) = lines.next_line().await? {
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                if matches!(message, "exit" | "quit") {
                    break;
                }

                let cancel = CancellationToken::new();
                let run = runner.run_with_cancel(message, &cancel);
                tokio::pin!(run);
                let finished = tokio::select! {
                    outcome = &mut run => Some(outcome),
                    _ = tokio::signal::ctrl_c() => None,
                };
                let outcome = match finished {
                    Some(outcome) => outcome,
                    None => {
                        cancel.cancel();
                        run.await
                    }
                };

                stdout
                    .write_all(format!("{}\n", outcome.text).as_bytes())
                    .await?;
                stdout.flush().await?;
            }
        }
        Commands::Info => {
            let index = VectorIndex::load(&config.index.path).await?;
            println!("{}", serde_json::to_string_pretty(index.manifest())?);
        }
    }

    Ok(())
}

async fn build_runner(config: RagbotConfig) -> anyhow::Result<AgentRunner> {
    let embedder = config.embedding.build_provider()?;
    let retrieval = RetrievalService::open(&config.index.path, embedder).await;
    if let Some(reason) = retrieval.unavailable_reason() {
        warn!(%reason, "Knowledge base unavailable, answers will not use it");
    }
    if config.model.api_key.is_empty() {
        warn!(provider = ?config.model.provider, "No API key configured");
    }
    Ok(AgentRunner::new(config.model, retrieval))
}
