//! Token counting boundary.
//!
//! Counts are used only for budget comparisons in the assembler; the chunker
//! never truncates text through the tokenizer.

use unicode_segmentation::UnicodeSegmentation;

#[cfg(feature = "tiktoken")]
use super::types::ChunkingError;

/// External tokenizer boundary: text in, token count out.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Model-free token estimate: one token per word plus one per three words,
/// approximating subword inflation. Useful where pulling in a real BPE
/// vocabulary is not worth it (tests, rough budgeting).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenCounter;

impl HeuristicTokenCounter {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        let words = text.unicode_words().count();
        words + words.div_ceil(3)
    }
}

/// BPE token counter backed by `tiktoken-rs`.
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    /// Counter over the `cl100k_base` vocabulary.
    pub fn cl100k() -> Result<Self, ChunkingError> {
        let bpe =
            tiktoken_rs::cl100k_base().map_err(|err| ChunkingError::Tokenizer(err.to_string()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Fixed tokens-per-word counter for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct WordTokenCounter;

impl TokenCounter for WordTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.unicode_words().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_counter_scales_with_words() {
        let counter = HeuristicTokenCounter::new();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("one two three"), 4);
        assert!(counter.count("a slightly longer sentence here") > counter.count("short one"));
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn tiktoken_counter_counts_bpe_tokens() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert!(counter.count("hello world") >= 2);
        assert_eq!(counter.count(""), 0);
    }
}
