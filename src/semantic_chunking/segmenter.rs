//! Paragraph segmentation.

use unicode_segmentation::UnicodeSegmentation;

use super::config::{SegmenterConfig, SplitMode};
use super::types::Paragraph;

/// Split raw text into ordered paragraphs.
///
/// Spans are trimmed and kept only if their word count exceeds
/// `config.min_words`; everything shorter carries too little topical signal
/// for clustering. Empty input, or input where nothing qualifies, yields an
/// empty vector — downstream stages treat that as a degenerate document, not
/// an error.
pub fn segment(text: &str, config: &SegmenterConfig) -> Vec<Paragraph> {
    let spans: Vec<&str> = match config.split {
        SplitMode::Newline => text.split('\n').collect(),
        SplitMode::BlankLine => text.split("\n\n").collect(),
    };

    spans
        .into_iter()
        .map(str::trim)
        .filter(|span| !span.is_empty() && word_count(span) > config.min_words)
        .enumerate()
        .map(|(index, span)| Paragraph::new(index, span))
        .collect()
}

/// Unicode-aware word count.
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}
