// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval service: embed the query, run the similarity search, shape the
//! response.
//!
//! The provider and store are constructed once at startup and injected
//! here; no process-wide singletons. This is the only module that knows the
//! wire shapes callers see.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;
use crate::errors::{Result, RetrievalError};
use crate::search::{SearchEngine, SearchStats};
use crate::store::VectorStore;

/// Default result count when the caller asks for `k <= 0`.
pub const DEFAULT_K: usize = 5;

/// The only supported search type.
pub const SEARCH_TYPE_SIMILARITY: &str = "similarity";

fn default_k() -> i64 {
    DEFAULT_K as i64
}

fn default_search_type() -> String {
    SEARCH_TYPE_SIMILARITY.to_string()
}

/// A retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Query text. Must not be empty.
    pub text: String,
    /// Number of results to return; values <= 0 are clamped to
    /// [`DEFAULT_K`].
    #[serde(default = "default_k")]
    pub k: i64,
    /// Search type; only `"similarity"` is supported.
    #[serde(default = "default_search_type")]
    pub search_type: String,
}

impl RetrievalRequest {
    pub fn new(text: impl Into<String>, k: i64) -> Self {
        Self {
            text: text.into(),
            k,
            search_type: default_search_type(),
        }
    }
}

/// Metadata attached to each retrieved document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Storage key of the record.
    pub id: String,
    /// Source label (e.g. `page_3`).
    pub source: String,
}

/// One retrieved document in the public response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub text: String,
    pub metadata: DocMetadata,
    /// Similarity score; omitted from the default response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Response to a retrieval query. Empty `retrieved_docs` is a successful
/// "no matches", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub retrieved_docs: Vec<RetrievedDoc>,
}

/// Liveness report including the active embedding model, so callers can
/// detect a dimension-incompatible deployment before querying.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    /// Model the service embeds queries with.
    pub model: String,
    /// Dimension the service embeds queries with.
    pub dimension: usize,
    /// Model recorded in the store at index time, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_model: Option<String>,
    /// Number of stored records.
    pub documents: u64,
}

/// Options governing response shaping.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOptions {
    /// Include similarity scores in responses.
    pub include_scores: bool,
    /// Per-query timeout; `None` means no deadline.
    pub timeout: Option<Duration>,
}

/// Orchestrates EmbeddingProvider -> SearchEngine -> response shaping.
pub struct RetrievalService {
    embedder: Box<dyn EmbeddingProvider>,
    store: VectorStore,
    options: RetrievalOptions,
}

impl RetrievalService {
    pub fn new(
        embedder: Box<dyn EmbeddingProvider>,
        store: VectorStore,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            options,
        }
    }

    /// Borrow the underlying store (read-only maintenance queries).
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Answers a retrieval query.
    pub fn retrieve(&mut self, request: &RetrievalRequest) -> Result<RetrievalResponse> {
        Ok(self.retrieve_with_stats(request)?.0)
    }

    /// Like [`Self::retrieve`], additionally returning scan statistics.
    pub fn retrieve_with_stats(
        &mut self,
        request: &RetrievalRequest,
    ) -> Result<(RetrievalResponse, SearchStats)> {
        if request.text.trim().is_empty() {
            return Err(RetrievalError::Validation(
                "query text must not be empty".to_string(),
            ));
        }
        if request.search_type != SEARCH_TYPE_SIMILARITY {
            return Err(RetrievalError::Validation(format!(
                "unsupported search_type '{}' (only '{}' is supported)",
                request.search_type, SEARCH_TYPE_SIMILARITY
            )));
        }

        let k = if request.k <= 0 {
            DEFAULT_K
        } else {
            request.k as usize
        };

        let query_vector = self
            .embedder
            .embed_one(&request.text)
            .map_err(RetrievalError::Embedding)?;

        let engine = SearchEngine::new(&self.store);
        let outcome = engine.search(&query_vector, k, self.options.timeout)?;

        tracing::debug!(
            candidates = outcome.stats.candidates,
            scored = outcome.stats.scored,
            skipped_dimension = outcome.stats.skipped_dimension,
            skipped_missing = outcome.stats.skipped_missing,
            returned = outcome.hits.len(),
            "retrieval query complete"
        );

        let retrieved_docs = outcome
            .hits
            .into_iter()
            .map(|hit| RetrievedDoc {
                text: hit.record.text,
                metadata: DocMetadata {
                    id: hit.record.id,
                    source: hit.record.source,
                },
                score: self.options.include_scores.then_some(hit.score),
            })
            .collect();

        Ok((RetrievalResponse { retrieved_docs }, outcome.stats))
    }

    /// Reports liveness plus the active embedding model. Status is
    /// `"degraded"` when the store was indexed with a different model than
    /// the service queries with.
    pub fn health(&self) -> Result<HealthReport> {
        let indexed_model = self
            .store
            .indexed_model()
            .map_err(RetrievalError::Storage)?;
        let documents = self.store.count().map_err(RetrievalError::Storage)?;

        let model = self.embedder.model_id().to_string();
        let status = match &indexed_model {
            Some(indexed) if indexed != &model => "degraded",
            _ => "healthy",
        };

        Ok(HealthReport {
            status,
            model,
            dimension: self.embedder.dimension(),
            indexed_model,
            documents,
        })
    }
}
