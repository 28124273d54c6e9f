//! Word-level truncation.

use super::{RefineError, Refiner};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").unwrap());

const ELLIPSIS: &str = "...";

/// Which part of the text survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TruncateStrategy {
    /// Keep the beginning
    #[default]
    Head,
    /// Keep the end
    Tail,
    /// Keep both ends, joined by "..."
    MiddleOut,
}

/// Truncate text to at most `max_tokens` words.
///
/// With sentence boundaries enabled, head and tail truncation keep whole
/// sentences when at least one fits, and fall back to cutting words otherwise.
#[derive(Debug, Clone)]
pub struct TruncateTokens {
    max_tokens: usize,
    strategy: TruncateStrategy,
    respect_sentence_boundary: bool,
}

impl TruncateTokens {
    pub fn new(max_tokens: usize, strategy: TruncateStrategy) -> Self {
        Self {
            max_tokens,
            strategy,
            respect_sentence_boundary: true,
        }
    }

    pub fn respect_sentence_boundary(mut self, enabled: bool) -> Self {
        self.respect_sentence_boundary = enabled;
        self
    }

    pub fn truncate(&self, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= self.max_tokens {
            return text.to_string();
        }

        if self.respect_sentence_boundary {
            if let Some(kept) = self.keep_sentences(text) {
                return kept;
            }
        }

        let max = self.max_tokens;
        match self.strategy {
            TruncateStrategy::Head => words[..max].join(" "),
            TruncateStrategy::Tail => words[words.len() - max..].join(" "),
            TruncateStrategy::MiddleOut => {
                let head = max - max / 2;
                let tail = max / 2;
                let mut parts: Vec<&str> = words[..head].to_vec();
                parts.push(ELLIPSIS);
                parts.extend_from_slice(&words[words.len() - tail..]);
                parts.join(" ")
            }
        }
    }

    fn keep_sentences(&self, text: &str) -> Option<String> {
        let sentences: Vec<&str> = SENTENCE_RE
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();

        let ordered: Vec<&str> = match self.strategy {
            TruncateStrategy::Head => sentences,
            TruncateStrategy::Tail => sentences.into_iter().rev().collect(),
            TruncateStrategy::MiddleOut => return None,
        };

        let mut kept = Vec::new();
        let mut words = 0;
        for sentence in ordered {
            let count = sentence.split_whitespace().count();
            if words + count > self.max_tokens {
                break;
            }
            words += count;
            kept.push(sentence);
        }

        if kept.is_empty() {
            return None;
        }
        if self.strategy == TruncateStrategy::Tail {
            kept.reverse();
        }
        Some(kept.join(" "))
    }
}

impl Refiner for TruncateTokens {
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        Ok(self.truncate(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_only(max: usize, strategy: TruncateStrategy) -> TruncateTokens {
        TruncateTokens::new(max, strategy).respect_sentence_boundary(false)
    }

    #[test]
    fn head_keeps_the_start() {
        let op = words_only(3, TruncateStrategy::Head);
        assert_eq!(op.truncate("one two three four five"), "one two three");
    }

    #[test]
    fn tail_keeps_the_end() {
        let op = words_only(3, TruncateStrategy::Tail);
        assert_eq!(op.truncate("one two three four five"), "three four five");
    }

    #[test]
    fn middle_out_keeps_both_ends() {
        let op = words_only(4, TruncateStrategy::MiddleOut);
        assert_eq!(
            op.truncate("one two three four five six"),
            "one two ... five six"
        );
    }

    #[test]
    fn short_text_is_untouched() {
        let op = TruncateTokens::new(10, TruncateStrategy::Head);
        assert_eq!(op.truncate("short text"), "short text");
    }

    #[test]
    fn head_respects_sentence_boundaries() {
        let op = TruncateTokens::new(8, TruncateStrategy::Head);
        let text = "First sentence here. Second sentence is longer. Third sentence.";
        assert_eq!(op.truncate(text), "First sentence here. Second sentence is longer.");
    }

    #[test]
    fn tail_respects_sentence_boundaries() {
        let op = TruncateTokens::new(5, TruncateStrategy::Tail);
        let text = "First sentence here. Second sentence is longer. Third sentence.";
        assert_eq!(op.truncate(text), "Third sentence.");
    }

    #[test]
    fn falls_back_to_words_when_no_sentence_fits() {
        let op = TruncateTokens::new(2, TruncateStrategy::Head);
        assert_eq!(op.truncate("One long sentence without an end"), "One long");
    }
}
