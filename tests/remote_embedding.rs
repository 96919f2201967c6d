// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the HTTP embedding client against a mock embedding service.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use docfind::embedding::{EmbeddingProvider, RemoteEmbedder};

fn embedder(url: &str, dimension: usize, max_attempts: usize, batch_size: usize) -> RemoteEmbedder {
    RemoteEmbedder::with_options(
        url,
        "test-model",
        dimension,
        Duration::from_secs(5),
        max_attempts,
        batch_size,
    )
    .unwrap()
}

#[test]
fn embeds_texts_via_http() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/embed")
            .json_body(json!({"inputs": ["hello", "world"]}));
        then.status(200)
            .json_body(json!({"embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]}));
    });

    let mut provider = embedder(&server.url("/embed"), 3, 1, 8);
    let vectors = provider
        .embed_texts(&["hello".to_string(), "world".to_string()])
        .unwrap();

    mock.assert();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
}

#[test]
fn retries_server_errors_up_to_max_attempts() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/embed");
        then.status(500).body("boom");
    });

    let mut provider = embedder(&server.url("/embed"), 3, 2, 8);
    let result = provider.embed_texts(&["hello".to_string()]);

    assert!(result.is_err());
    mock.assert_hits(2);
}

#[test]
fn client_errors_are_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/embed");
        then.status(400).body("bad request");
    });

    let mut provider = embedder(&server.url("/embed"), 3, 3, 8);
    let result = provider.embed_texts(&["hello".to_string()]);

    assert!(result.is_err());
    mock.assert_hits(1);
}

#[test]
fn rejects_wrong_dimension() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/embed");
        then.status(200).json_body(json!({"embeddings": [[0.1, 0.2]]}));
    });

    let mut provider = embedder(&server.url("/embed"), 3, 1, 8);
    let err = provider.embed_texts(&["hello".to_string()]).unwrap_err();
    assert!(err.to_string().contains("dimension"));
}

#[test]
fn rejects_vector_count_mismatch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/embed");
        then.status(200)
            .json_body(json!({"embeddings": [[0.1, 0.2, 0.3]]}));
    });

    let mut provider = embedder(&server.url("/embed"), 3, 1, 8);
    let err = provider
        .embed_texts(&["a".to_string(), "b".to_string()])
        .unwrap_err();
    assert!(err.to_string().contains("2 inputs"));
}

#[test]
fn batches_requests_by_batch_size() {
    let server = MockServer::start();
    let two = server.mock(|when, then| {
        when.method(POST)
            .path("/embed")
            .json_body(json!({"inputs": ["a", "b"]}));
        then.status(200)
            .json_body(json!({"embeddings": [[1.0], [2.0]]}));
    });
    let one = server.mock(|when, then| {
        when.method(POST)
            .path("/embed")
            .json_body(json!({"inputs": ["c"]}));
        then.status(200).json_body(json!({"embeddings": [[3.0]]}));
    });

    let mut provider = embedder(&server.url("/embed"), 1, 1, 2);
    let vectors = provider
        .embed_texts(&["a".to_string(), "b".to_string(), "c".to_string()])
        .unwrap();

    two.assert();
    one.assert();
    assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);
}
