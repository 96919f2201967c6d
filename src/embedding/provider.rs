// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The same provider configuration must be used at index time and query
//! time; vectors from different models are not comparable. The store
//! records the active model so `docfind health` can flag a mismatch.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Default embedding dimension (sentence-transformers/all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default model identifier reported by the remote embedding service.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const DEFAULT_BATCH_SIZE: usize = 64;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: usize = 2;
const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the vector dimension this provider produces.
    fn dimension(&self) -> usize;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates embeddings for the given texts, one vector per input.
    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Blocking client for an HTTP embedding service.
///
/// POSTs `{"inputs": [...]}` to the configured endpoint and expects
/// `{"embeddings": [[f32, ...], ...]}` back. Transport errors and
/// 429/5xx responses are retried at most `max_attempts - 1` times with
/// linear backoff; anything else fails immediately.
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model_id: String,
    dimension: usize,
    batch_size: usize,
    max_attempts: usize,
}

impl RemoteEmbedder {
    /// Builds a remote embedder for `endpoint` (e.g. `http://host:8080/embed`).
    pub fn new(endpoint: &str, model_id: &str, dimension: usize) -> Result<Self> {
        Self::with_options(
            endpoint,
            model_id,
            dimension,
            DEFAULT_TIMEOUT,
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_BATCH_SIZE,
        )
    }

    pub fn with_options(
        endpoint: &str,
        model_id: &str,
        dimension: usize,
        timeout: Duration,
        max_attempts: usize,
        batch_size: usize,
    ) -> Result<Self> {
        if endpoint.trim().is_empty() {
            bail!("embedding endpoint must not be empty");
        }
        if dimension == 0 {
            bail!("embedding dimension must be greater than 0");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build embedding HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            dimension,
            batch_size: batch_size.max(1),
            max_attempts: max_attempts.max(1),
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        RETRY_BACKOFF_BASE * attempt as u32
    }

    fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = self
                .client
                .post(&self.endpoint)
                .json(&EmbedRequest { inputs: texts })
                .send();

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbedResponse = resp
                            .json()
                            .context("Failed to parse embedding service response")?;
                        if parsed.embeddings.len() != texts.len() {
                            bail!(
                                "Embedding service returned {} vectors for {} inputs",
                                parsed.embeddings.len(),
                                texts.len()
                            );
                        }
                        for vector in &parsed.embeddings {
                            if vector.len() != self.dimension {
                                bail!(
                                    "Embedding service returned dimension {} (expected {})",
                                    vector.len(),
                                    self.dimension
                                );
                            }
                        }
                        return Ok(parsed.embeddings);
                    }

                    let body = resp.text().unwrap_or_else(|_| "<no body>".to_string());
                    if Self::should_retry(status) && attempt < self.max_attempts {
                        tracing::warn!(%status, attempt, "embedding request failed, retrying");
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    bail!("Embedding request failed ({}): {}", status, body.trim());
                }
                Err(err) => {
                    if attempt < self.max_attempts {
                        tracing::warn!(error = %err, attempt, "embedding request errored, retrying");
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    return Err(err).context("Embedding service unreachable");
                }
            }
        }
    }
}

impl EmbeddingProvider for RemoteEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.request_batch(batch)?);
        }
        Ok(vectors)
    }
}

/// Dummy provider that returns zero vectors (for testing/offline use).
pub struct DummyProvider {
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl DummyProvider {
    /// Creates a new dummy provider with the specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            model: "dummy".to_string(),
            dimension,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl EmbeddingProvider for DummyProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
