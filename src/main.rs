// SPDX-License-Identifier: MIT OR Apache-2.0

//! docfind - Local document retrieval tool
//!
//! Chunk extracted document text, embed it, and answer exact
//! k-nearest-neighbor similarity queries from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docfind::cli::{Cli, Commands, OutputFormat};
use docfind::config::{Config, EmbeddingProviderType};
use docfind::embedding::{DummyProvider, EmbeddingProvider, RemoteEmbedder};
use docfind::indexer;
use docfind::output;
use docfind::retrieval::{RetrievalOptions, RetrievalRequest, RetrievalService};
use docfind::segmenter::{SegmenterConfig, TextSegmenter};
use docfind::store::VectorStore;

fn build_provider(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    let embeddings = &config.embeddings;
    match embeddings.provider() {
        EmbeddingProviderType::Remote => {
            let embedder = RemoteEmbedder::with_options(
                embeddings.endpoint(),
                embeddings.model(),
                embeddings.dimension(),
                embeddings.timeout(),
                embeddings.max_attempts(),
                embeddings.batch_size(),
            )?;
            Ok(Box::new(embedder))
        }
        EmbeddingProviderType::Dummy => Ok(Box::new(DummyProvider::new(embeddings.dimension()))),
    }
}

fn open_store(config: &Config, db_override: Option<PathBuf>) -> Result<VectorStore> {
    let path = db_override.unwrap_or_else(|| config.store.path());
    VectorStore::open(path)
}

fn main() -> Result<()> {
    // Initialize tracing with the DOCFIND_LOG env var
    // (e.g., DOCFIND_LOG=debug docfind query "...").
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DOCFIND_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Index {
            input,
            source,
            max_chars,
        } => {
            let store = open_store(&config, cli.db)?;
            let mut embedder = build_provider(&config)?;
            let segmenter = TextSegmenter::new(SegmenterConfig {
                max_chars: max_chars.unwrap_or_else(|| config.segmenter.max_chars()),
                chunk_overlap: config.segmenter.chunk_overlap(),
            });

            let label = match source {
                Some(label) => label,
                None => input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
                    .context("cannot derive a document label from the input path; pass --source")?,
            };

            let pages = indexer::load_pages(&input)?;
            let summary =
                indexer::index_pages(&store, embedder.as_mut(), &segmenter, &pages, &label)?;

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "pages": summary.pages,
                        "chunks": summary.chunks,
                        "embedded": summary.embedded,
                    })
                ),
                OutputFormat::Text => println!(
                    "Indexed {} chunks from {} pages ({} embedded)",
                    summary.chunks, summary.pages, summary.embedded
                ),
            }
        }

        Commands::Query {
            text,
            k,
            search_type,
            scores,
            timeout_ms,
        } => {
            let store = open_store(&config, cli.db)?;
            let embedder = build_provider(&config)?;
            let options = RetrievalOptions {
                include_scores: scores || config.query.include_scores(),
                timeout: timeout_ms
                    .map(Duration::from_millis)
                    .or_else(|| config.query.timeout()),
            };
            let mut service = RetrievalService::new(embedder, store, options);

            let request = RetrievalRequest {
                text,
                k,
                search_type,
            };
            let response = service.retrieve(&request)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                OutputFormat::Text => println!("{}", output::render_text(&response)),
            }
        }

        Commands::Health => {
            let store = open_store(&config, cli.db)?;
            let embedder = build_provider(&config)?;
            let service = RetrievalService::new(embedder, store, RetrievalOptions::default());
            let report = service.health()?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => {
                    println!("status: {}", report.status);
                    println!("model: {} (dimension {})", report.model, report.dimension);
                    if let Some(indexed) = &report.indexed_model {
                        println!("indexed with: {}", indexed);
                    }
                    println!("documents: {}", report.documents);
                }
            }
        }

        Commands::Stats => {
            let store = open_store(&config, cli.db)?;
            let count = store.count()?;
            let model = store.indexed_model()?;
            let dimension = store.dimension()?;

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "documents": count,
                        "model": model,
                        "dimension": dimension,
                    })
                ),
                OutputFormat::Text => {
                    println!("documents: {}", count);
                    match (model, dimension) {
                        (Some(model), Some(dimension)) => {
                            println!("model: {} (dimension {})", model, dimension)
                        }
                        _ => println!("model: not recorded (nothing indexed yet)"),
                    }
                }
            }
        }

        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all records without --yes");
            }
            let store = open_store(&config, cli.db)?;
            let count = store.count()?;
            store.clear()?;
            println!("Deleted {} records", count);
        }
    }

    Ok(())
}
