// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text segmentation for embedding generation.
//!
//! Turns a page of extracted text into an ordered sequence of size-bounded
//! chunks. Sentences are packed greedily in source order; a chunk is closed
//! when the next sentence would push it past `max_chars`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 1000;

/// Default chunk overlap setting.
///
/// Accepted for configuration compatibility but not applied: emitted chunks
/// never overlap. See `TextSegmenter::segment`.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\s*$").unwrap());
// A sentence is any run of non-terminal characters plus the punctuation run
// that closes it; a final unterminated run is kept as its own sentence.
static SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());

/// Configuration for the text segmenter.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Configured overlap between chunks. Retained from the upstream
    /// configuration surface; segmentation does not apply it.
    pub chunk_overlap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl SegmenterConfig {
    /// Creates a config with the given chunk size, keeping other defaults.
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Default::default()
        }
    }
}

/// A bounded unit of extracted text tagged with its page of origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text. Never empty.
    pub text: String,
    /// Page number (1-indexed).
    pub page: u32,
    /// Synthetic source label, `page_{page}`.
    pub source: String,
}

impl Chunk {
    fn new(text: String, page: u32) -> Self {
        let source = format!("page_{}", page);
        Self { text, page, source }
    }
}

/// Splits page text into ordered, size-bounded chunks.
pub struct TextSegmenter {
    config: SegmenterConfig,
}

impl TextSegmenter {
    /// Creates a new segmenter with the given configuration.
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Creates a segmenter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SegmenterConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Normalizes whitespace and strips a trailing standalone page-number
    /// artifact.
    pub fn clean_text(text: &str) -> String {
        let collapsed = WHITESPACE_RUN.replace_all(text, " ");
        let stripped = TRAILING_PAGE_NUMBER.replace(collapsed.trim(), "");
        stripped.trim().to_string()
    }

    /// Segments one page of raw extracted text into chunks.
    ///
    /// Sentences (split on terminal `.`, `!`, `?` runs, punctuation kept)
    /// are packed greedily in order until adding the next sentence would
    /// exceed `max_chars`. A single sentence longer than the limit is
    /// emitted as its own oversized chunk rather than being split further.
    /// Empty or whitespace-only pages produce no chunks. Chunks never
    /// overlap and never cross pages.
    pub fn segment(&self, page_text: &str, page: u32) -> Vec<Chunk> {
        let text = Self::clean_text(page_text);
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for m in SENTENCE.find_iter(&text) {
            let sentence = m.as_str().trim();
            if sentence.is_empty() {
                continue;
            }
            let sentence_len = sentence.chars().count();
            // Account for the joining space so packed chunks never exceed
            // the limit.
            let joined_len = current_len + 1 + sentence_len;

            if joined_len > self.config.max_chars && !current.is_empty() {
                chunks.push(Chunk::new(std::mem::take(&mut current), page));
                current.push_str(sentence);
                current_len = sentence_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(sentence);
                current_len += sentence_len;
            }
        }

        if !current.is_empty() {
            chunks.push(Chunk::new(current, page));
        }

        tracing::debug!(page, chunks = chunks.len(), "segmented page");
        chunks
    }

    /// Segments an ordered sequence of `(page, text)` pairs, preserving
    /// page order.
    pub fn segment_pages<'a, I>(&self, pages: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        pages
            .into_iter()
            .flat_map(|(page, text)| self.segment(text, page))
            .collect()
    }
}
