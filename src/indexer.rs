// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indexing pipeline: extracted pages -> chunks -> embeddings -> store.
//!
//! Text extraction itself lives outside this crate; the input contract is
//! an ordered sequence of `(page, text)` pairs, either as a JSON array or
//! as plain text with form-feed page separators (what `pdftotext`-style
//! extractors emit).

use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use crate::embedding::EmbeddingProvider;
use crate::segmenter::{Chunk, TextSegmenter};
use crate::store::VectorStore;

/// One page of extracted document text.
#[derive(Debug, Clone, Deserialize)]
pub struct PageInput {
    /// Page number (1-indexed).
    pub page: u32,
    /// Raw extracted text for the page.
    pub text: String,
}

/// Counters reported after an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Pages consumed.
    pub pages: usize,
    /// Chunks produced by segmentation.
    pub chunks: usize,
    /// Chunks embedded and upserted.
    pub embedded: usize,
}

/// Loads pages from an input file.
///
/// `.json` files must contain `[{"page": 1, "text": "..."}, ...]`; any
/// other file is read as plain text and split into pages on form feeds
/// (`\x0c`), or treated as a single page if none are present.
pub fn load_pages(path: &Path) -> Result<Vec<PageInput>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let pages: Vec<PageInput> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pages from {}", path.display()))?;
        for input in &pages {
            if input.page == 0 {
                bail!("page numbers are 1-indexed; got page 0");
            }
        }
        return Ok(pages);
    }

    Ok(content
        .split('\x0c')
        .enumerate()
        .map(|(i, text)| PageInput {
            page: (i + 1) as u32,
            text: text.to_string(),
        })
        .collect())
}

/// Derives a stable record id for a chunk.
///
/// Hashing the label, page, ordinal, and text means re-indexing the same
/// document upserts the same keys instead of accumulating duplicates.
fn chunk_id(label: &str, chunk: &Chunk, ordinal: usize) -> String {
    let input = format!("{}:{}:{}:{}", label, chunk.page, ordinal, chunk.text);
    let hash = blake3::hash(input.as_bytes());
    format!("doc:{}:{}", label, &hash.to_hex()[..16])
}

/// Segments, embeds, and upserts the given pages under `label`.
///
/// Records the provider's model and dimension in the store so later runs
/// and health checks can detect a model switch.
pub fn index_pages(
    store: &VectorStore,
    embedder: &mut dyn EmbeddingProvider,
    segmenter: &TextSegmenter,
    pages: &[PageInput],
    label: &str,
) -> Result<IndexSummary> {
    if label.trim().is_empty() {
        bail!("document label must not be empty");
    }

    if let Some(previous) = store.indexed_model()? {
        if previous != embedder.model_id() {
            tracing::warn!(
                previous_model = %previous,
                model = %embedder.model_id(),
                "store was indexed with a different embedding model"
            );
        }
    }

    let mut summary = IndexSummary {
        pages: pages.len(),
        ..Default::default()
    };

    let chunks: Vec<Chunk> =
        segmenter.segment_pages(pages.iter().map(|p| (p.page, p.text.as_str())));
    summary.chunks = chunks.len();

    if chunks.is_empty() {
        tracing::info!(label, "no chunks to index");
        return Ok(summary);
    }

    store.record_model(embedder.model_id(), embedder.dimension())?;

    let bar = ProgressBar::new(chunks.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("embedding");

    for batch in chunks.chunks(embedder.batch_size()) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder
            .embed_texts(&texts)
            .context("Failed to embed chunk batch")?;
        if vectors.len() != batch.len() {
            bail!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            );
        }

        for (chunk, vector) in batch.iter().zip(vectors.iter()) {
            let id = chunk_id(label, chunk, summary.embedded);
            store.put(
                &id,
                &chunk.text,
                Some(chunk.page),
                &chunk.source,
                Some(vector),
            )?;
            summary.embedded += 1;
            bar.inc(1);
        }
    }

    bar.finish_and_clear();
    tracing::info!(
        label,
        pages = summary.pages,
        chunks = summary.chunks,
        embedded = summary.embedded,
        "indexing complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::DummyProvider;
    use crate::segmenter::SegmenterConfig;
    use tempfile::tempdir;

    #[test]
    fn test_index_pages_end_to_end() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path().join("test.sqlite")).unwrap();
        let mut embedder = DummyProvider::new(4);
        let segmenter = TextSegmenter::new(SegmenterConfig::with_max_chars(50));

        let pages = vec![
            PageInput {
                page: 1,
                text: "First sentence. Second sentence.".to_string(),
            },
            PageInput {
                page: 2,
                text: "Third sentence.".to_string(),
            },
        ];

        let summary = index_pages(&store, &mut embedder, &segmenter, &pages, "paper").unwrap();
        assert_eq!(summary.pages, 2);
        assert!(summary.chunks >= 2);
        assert_eq!(summary.embedded, summary.chunks);
        assert_eq!(store.count().unwrap(), summary.chunks as u64);
        assert_eq!(store.indexed_model().unwrap().unwrap(), "dummy");
        assert_eq!(store.dimension().unwrap().unwrap(), 4);
    }

    #[test]
    fn test_reindexing_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path().join("test.sqlite")).unwrap();
        let mut embedder = DummyProvider::new(4);
        let segmenter = TextSegmenter::with_defaults();

        let pages = vec![PageInput {
            page: 1,
            text: "Stable content.".to_string(),
        }];

        index_pages(&store, &mut embedder, &segmenter, &pages, "doc").unwrap();
        let count_first = store.count().unwrap();
        index_pages(&store, &mut embedder, &segmenter, &pages, "doc").unwrap();
        assert_eq!(store.count().unwrap(), count_first);
    }

    #[test]
    fn test_blank_pages_index_nothing() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path().join("test.sqlite")).unwrap();
        let mut embedder = DummyProvider::new(4);
        let segmenter = TextSegmenter::with_defaults();

        let pages = vec![PageInput {
            page: 1,
            text: "   \n ".to_string(),
        }];
        let summary = index_pages(&store, &mut embedder, &segmenter, &pages, "doc").unwrap();
        assert_eq!(summary.chunks, 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_load_pages_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.json");
        std::fs::write(
            &path,
            r#"[{"page": 1, "text": "one."}, {"page": 2, "text": "two."}]"#,
        )
        .unwrap();

        let pages = load_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].text, "two.");
    }

    #[test]
    fn test_load_pages_form_feed_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "page one text\x0cpage two text").unwrap();

        let pages = load_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].page, 2);
        assert_eq!(pages[1].text, "page two text");
    }

    #[test]
    fn test_load_pages_rejects_page_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.json");
        std::fs::write(&path, r#"[{"page": 0, "text": "bad"}]"#).unwrap();
        assert!(load_pages(&path).is_err());
    }
}
