// SPDX-License-Identifier: MIT OR Apache-2.0

//! docfind - Local document retrieval library
//!
//! Shared modules for the docfind CLI tool: text segmentation, embedding
//! providers, the SQLite vector store, exact k-NN search, and the
//! retrieval service that ties them together.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod indexer;
pub mod output;
pub mod retrieval;
pub mod search;
pub mod segmenter;
pub mod store;
