// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for docfind
//!
//! Loads configuration from .docfindrc.toml in the current directory or
//! ~/.config/docfind/config.toml

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::embedding::{DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_MODEL};
use crate::segmenter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_MAX_CHARS};

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// HTTP embedding service
    #[default]
    Remote,
    /// Zero vectors, for tests and offline smoke runs
    Dummy,
}

/// Segmenter configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SegmenterSection {
    /// Maximum characters per chunk
    pub max_chars: Option<usize>,
    /// Configured overlap between chunks (accepted, not applied)
    pub chunk_overlap: Option<usize>,
}

impl SegmenterSection {
    /// Get max chars per chunk (defaults to 1000)
    pub fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(DEFAULT_MAX_CHARS)
    }

    /// Get configured chunk overlap (defaults to 200)
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    /// Provider type (remote, dummy)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier the provider serves
    pub model: Option<String>,
    /// Endpoint of the remote embedding service
    pub endpoint: Option<String>,
    /// Vector dimension the model produces
    pub dimension: Option<usize>,
    /// HTTP request timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Total request attempts (1 = no retry)
    pub max_attempts: Option<usize>,
    /// Texts per embedding request
    pub batch_size: Option<usize>,
}

impl EmbeddingSection {
    /// Get provider type (defaults to Remote)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_EMBEDDING_MODEL)
    }

    /// Get endpoint (defaults to a local embedding server)
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or("http://localhost:8080/embed")
    }

    /// Get vector dimension (defaults to 384)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_EMBEDDING_DIM)
    }

    /// Get request timeout (defaults to 30s)
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(30_000))
    }

    /// Get total attempts (defaults to 2: one retry)
    pub fn max_attempts(&self) -> usize {
        self.max_attempts.unwrap_or(2).max(1)
    }

    /// Get batch size (defaults to 64)
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(64).max(1)
    }
}

/// Store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Path to the SQLite database file
    pub path: Option<PathBuf>,
}

impl StoreSection {
    /// Get database path (defaults to .docfind/vectors.sqlite)
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(".docfind").join("vectors.sqlite"))
    }
}

/// Query behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Include similarity scores in responses
    pub include_scores: Option<bool>,
    /// Per-query timeout in milliseconds (0 = none)
    pub timeout_ms: Option<u64>,
}

impl QuerySection {
    /// Get include_scores (defaults to false)
    pub fn include_scores(&self) -> bool {
        self.include_scores.unwrap_or(false)
    }

    /// Get query timeout (defaults to none)
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Configuration loaded from .docfindrc.toml or ~/.config/docfind/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Segmenter configuration
    #[serde(default)]
    pub segmenter: SegmenterSection,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingSection,

    /// Store configuration
    #[serde(default)]
    pub store: StoreSection,

    /// Query configuration
    #[serde(default)]
    pub query: QuerySection,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .docfindrc.toml in current directory
    /// 2. ~/.config/docfind/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(&PathBuf::from(".docfindrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("docfind").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }
}
