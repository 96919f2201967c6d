// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docfind - Local document retrieval tool
///
/// Segments extracted document text into bounded chunks, embeds them, and
/// answers exact k-nearest-neighbor similarity queries over the corpus.
#[derive(Parser, Debug)]
#[command(name = "docfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Path to the vector database (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Segment, embed, and store a document's extracted text
    #[command(alias = "i")]
    Index {
        /// Input file: a JSON array of {"page", "text"} objects, or plain
        /// text with form-feed page breaks
        input: PathBuf,

        /// Document label used to derive record ids
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum characters per chunk (overrides config)
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Retrieve the documents most similar to a query
    #[command(alias = "q")]
    Query {
        /// Query text
        text: String,

        /// Number of results to return (values <= 0 fall back to 5)
        #[arg(short, long, default_value = "5")]
        k: i64,

        /// Search type (only "similarity" is supported)
        #[arg(long, default_value = "similarity")]
        search_type: String,

        /// Include similarity scores in the output
        #[arg(long)]
        scores: bool,

        /// Per-query timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Report liveness and the active embedding model
    Health,

    /// Show corpus statistics
    Stats,

    /// Delete all stored records
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
