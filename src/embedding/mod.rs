// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns text into fixed-dimension vectors.
//!
//! The provider used to embed chunks at index time and the provider used to
//! embed queries at search time must be the same model and dimension.

pub mod provider;

pub use provider::{
    DummyProvider, EmbeddingProvider, RemoteEmbedder, DEFAULT_EMBEDDING_DIM,
    DEFAULT_EMBEDDING_MODEL,
};
