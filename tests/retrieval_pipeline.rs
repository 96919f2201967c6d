// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library-level pipeline test: pages in, ranked documents out, using a
//! deterministic keyword embedder so ranking assertions are exact.

use anyhow::Result;
use tempfile::tempdir;

use docfind::embedding::EmbeddingProvider;
use docfind::indexer::{index_pages, PageInput};
use docfind::retrieval::{RetrievalOptions, RetrievalRequest, RetrievalService};
use docfind::segmenter::TextSegmenter;
use docfind::store::VectorStore;

const KEYWORDS: [&str; 3] = ["cat", "rust", "ocean"];

/// Embeds text as keyword occurrence counts. Same text, same vector.
struct KeywordEmbedder;

impl EmbeddingProvider for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keyword-counts"
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len()
    }

    fn batch_size(&self) -> usize {
        16
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                KEYWORDS
                    .iter()
                    .map(|kw| lower.matches(kw).count() as f32)
                    .collect()
            })
            .collect())
    }
}

#[test]
fn pipeline_ranks_topically_relevant_chunks_first() {
    let dir = tempdir().unwrap();
    let store = VectorStore::open(dir.path().join("db.sqlite")).unwrap();
    let segmenter = TextSegmenter::with_defaults();
    let mut embedder = KeywordEmbedder;

    let pages = vec![
        PageInput {
            page: 1,
            text: "The cat sat on the mat. Another cat joined.".to_string(),
        },
        PageInput {
            page: 2,
            text: "Rust programs compile to native code.".to_string(),
        },
        PageInput {
            page: 3,
            text: "The ocean covers most of the planet.".to_string(),
        },
    ];

    let summary = index_pages(&store, &mut embedder, &segmenter, &pages, "book").unwrap();
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.embedded, summary.chunks);

    let mut service = RetrievalService::new(
        Box::new(KeywordEmbedder),
        store,
        RetrievalOptions {
            include_scores: true,
            timeout: None,
        },
    );

    let response = service
        .retrieve(&RetrievalRequest::new("a cat, my cat", 3))
        .unwrap();

    assert!(!response.retrieved_docs.is_empty());
    let top = &response.retrieved_docs[0];
    assert!(top.text.contains("cat"));
    assert_eq!(top.metadata.source, "page_1");
    assert!((top.score.unwrap() - 1.0).abs() < 1e-6);

    // Remaining hits share no keywords with the query and score zero.
    for doc in &response.retrieved_docs[1..] {
        assert!(doc.score.unwrap().abs() < 1e-6);
    }
}

#[test]
fn health_degrades_after_model_switch() {
    let dir = tempdir().unwrap();
    let store = VectorStore::open(dir.path().join("db.sqlite")).unwrap();
    let segmenter = TextSegmenter::with_defaults();
    let mut embedder = KeywordEmbedder;

    let pages = vec![PageInput {
        page: 1,
        text: "Some indexed content.".to_string(),
    }];
    index_pages(&store, &mut embedder, &segmenter, &pages, "doc").unwrap();

    store.record_model("different-model", 3).unwrap();
    let service = RetrievalService::new(
        Box::new(KeywordEmbedder),
        store,
        RetrievalOptions::default(),
    );

    let report = service.health().unwrap();
    assert_eq!(report.status, "degraded");
    assert_eq!(report.indexed_model.as_deref(), Some("different-model"));
}
