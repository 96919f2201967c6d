// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output and color utilities for consistent terminal formatting
//!
//! Provides shared color functions respecting the NO_COLOR environment
//! variable, plus the text rendering of query results.

use colored::Colorize;

use crate::retrieval::RetrievalResponse;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Colorize a record id (cyan)
pub fn colorize_id(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize a source label (green)
pub fn colorize_source(text: &str, use_color: bool) -> String {
    if use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize a similarity score (yellow)
pub fn colorize_score(score: f32, use_color: bool) -> String {
    let rendered = format!("{:.4}", score);
    if use_color {
        rendered.yellow().to_string()
    } else {
        rendered
    }
}

/// Render a retrieval response for the terminal.
pub fn render_text(response: &RetrievalResponse) -> String {
    let color = use_colors();
    if response.retrieved_docs.is_empty() {
        return "No matching documents.".to_string();
    }

    let mut out = String::new();
    for (rank, doc) in response.retrieved_docs.iter().enumerate() {
        let header = match doc.score {
            Some(score) => format!(
                "{}. {} ({}) score={}",
                rank + 1,
                colorize_id(&doc.metadata.id, color),
                colorize_source(&doc.metadata.source, color),
                colorize_score(score, color),
            ),
            None => format!(
                "{}. {} ({})",
                rank + 1,
                colorize_id(&doc.metadata.id, color),
                colorize_source(&doc.metadata.source, color),
            ),
        };
        out.push_str(&header);
        out.push('\n');
        out.push_str(&doc.text);
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}
