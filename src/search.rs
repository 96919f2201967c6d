// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact brute-force k-nearest-neighbor search over the vector store.
//!
//! Every stored candidate is scored against the query vector with cosine
//! similarity; O(N*D) time and O(N) auxiliary space per query, no index
//! structure maintained. Scoring is parallelized with rayon, but the final
//! sort and tie-break make the output independent of scan and scoring
//! order: repeated queries over an unchanged corpus are bit-identical.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::errors::{Result, RetrievalError};
use crate::store::{VectorRecord, VectorStore};

/// A scored candidate from a similarity search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matching record.
    pub record: VectorRecord,
    /// Cosine similarity against the query vector, in [-1, 1].
    pub score: f32,
}

/// Per-query scan counters, surfaced in aggregate for observability.
/// Skips are never per-query failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Records seen by the scan.
    pub candidates: usize,
    /// Records actually scored.
    pub scored: usize,
    /// Records skipped because they have no embedding yet.
    pub skipped_missing: usize,
    /// Records skipped because their vector dimension differs from the
    /// query's.
    pub skipped_dimension: usize,
    /// Rows the store could not decode.
    pub skipped_malformed: usize,
}

/// Result of one search: ranked hits plus scan statistics.
#[derive(Debug)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub stats: SearchStats,
}

/// Brute-force similarity search engine over a [`VectorStore`].
pub struct SearchEngine<'a> {
    store: &'a VectorStore,
}

impl<'a> SearchEngine<'a> {
    pub fn new(store: &'a VectorStore) -> Self {
        Self { store }
    }

    /// Returns the `k` stored records most similar to `query`, ranked by
    /// descending cosine similarity and tie-broken by ascending id.
    ///
    /// `k == 0` and an empty corpus both yield an empty, successful result.
    /// When `timeout` is set, a query that exceeds it aborts with
    /// [`RetrievalError::Timeout`] rather than blocking.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        timeout: Option<Duration>,
    ) -> Result<SearchOutcome> {
        let deadline = timeout.map(|t| (Instant::now() + t, t));

        let scan = self
            .store
            .scan_all()
            .map_err(RetrievalError::Storage)?;

        Self::check_deadline(deadline)?;

        let mut stats = SearchStats {
            candidates: scan.records.len(),
            skipped_malformed: scan.malformed,
            ..Default::default()
        };

        if k == 0 || scan.records.is_empty() {
            return Ok(SearchOutcome {
                hits: Vec::new(),
                stats,
            });
        }

        // Score in parallel; order is restored by the sort below.
        let scored: Vec<Scored> = scan
            .records
            .into_par_iter()
            .map(|record| match &record.embedding {
                None => Scored::MissingVector,
                Some(v) if v.len() != query.len() => Scored::WrongDimension,
                Some(v) => {
                    let score = cosine_similarity(query, v);
                    Scored::Hit(SearchHit { record, score })
                }
            })
            .collect();

        Self::check_deadline(deadline)?;

        let mut hits = Vec::with_capacity(scored.len());
        for item in scored {
            match item {
                Scored::Hit(hit) => hits.push(hit),
                Scored::MissingVector => stats.skipped_missing += 1,
                Scored::WrongDimension => stats.skipped_dimension += 1,
            }
        }
        stats.scored = hits.len();

        if stats.skipped_dimension > 0 {
            tracing::warn!(
                skipped = stats.skipped_dimension,
                query_dimension = query.len(),
                "excluded records with mismatched vector dimension"
            );
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        hits.truncate(k);

        Ok(SearchOutcome { hits, stats })
    }

    fn check_deadline(deadline: Option<(Instant, Duration)>) -> Result<()> {
        if let Some((deadline, timeout)) = deadline {
            if Instant::now() > deadline {
                return Err(RetrievalError::Timeout(timeout));
            }
        }
        Ok(())
    }
}

enum Scored {
    Hit(SearchHit),
    MissingVector,
    WrongDimension,
}

/// Cosine similarity between two equal-length vectors.
///
/// A zero-norm vector on either side scores 0.0 instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
