// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the retrieval pipeline.
//!
//! Distinguishes "no matches" (a successful, empty result) from actual
//! failures, and keeps per-record conditions (dimension mismatch, malformed
//! rows) out of the per-query error surface entirely.

use std::time::Duration;

/// Errors surfaced by [`crate::retrieval::RetrievalService`].
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Malformed request; rejected immediately, never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Embedding service unreachable or misbehaving. The provider performs
    /// its own bounded retries before this is raised.
    #[error("embedding service unavailable: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Backing store unreachable or failed mid-query. Never silently
    /// reported as an empty corpus.
    #[error("vector store unavailable: {0}")]
    Storage(#[source] anyhow::Error),

    /// Query exceeded its configured deadline.
    #[error("query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
