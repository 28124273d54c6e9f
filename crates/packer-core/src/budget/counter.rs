//! Token counting for budget management.
//!
//! Provides heuristic token estimation (chars/4) and, with the `tokenizers`
//! feature, exact counting against a HuggingFace tokenizer file.

use std::sync::Arc;

/// Trait for token counting implementations.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a plain text string.
    fn count_text(&self, text: &str) -> usize;

    /// Whether counts come from the model's real tokenizer.
    ///
    /// Approximate counters get a 10% safety margin on the budget ceiling.
    fn is_exact(&self) -> bool;
}

/// Heuristic token counter using character-based estimation.
///
/// Uses the approximation: tokens ≈ characters / 4, rounded up, with a floor of
/// one token for any non-empty text.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    /// Characters per token ratio (default: 4)
    chars_per_token: f64,
}

impl HeuristicTokenCounter {
    /// Create a new heuristic counter with a custom ratio.
    pub fn new(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }

    /// Create with default parameters (4 chars per token).
    pub fn with_defaults() -> Self {
        Self {
            chars_per_token: 4.0,
        }
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let char_count = text.chars().count() as f64;
        let tokens = (char_count / self.chars_per_token).ceil() as usize;
        tokens.max(1)
    }

    fn is_exact(&self) -> bool {
        false
    }
}

/// Exact counter backed by a HuggingFace `tokenizer.json`.
#[cfg(feature = "tokenizers")]
pub struct TokenizerCounter {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "tokenizers")]
impl TokenizerCounter {
    /// Load a tokenizer definition from disk.
    pub fn from_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::budget::types::PackError> {
        let path = path.as_ref();
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            crate::budget::types::PackError::Tokenizer(format!(
                "failed to load {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { tokenizer })
    }
}

#[cfg(feature = "tokenizers")]
impl std::fmt::Debug for TokenizerCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerCounter").finish_non_exhaustive()
    }
}

#[cfg(feature = "tokenizers")]
impl TokenCounter for TokenizerCounter {
    fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                // Fall back to the estimate rather than failing the pack.
                tracing::warn!("Tokenizer failed to encode text, estimating instead: {}", e);
                HeuristicTokenCounter::default().count_text(text)
            }
        }
    }

    fn is_exact(&self) -> bool {
        true
    }
}

/// Arc-wrapped token counter for easy sharing.
pub type SharedTokenCounter = Arc<dyn TokenCounter>;
