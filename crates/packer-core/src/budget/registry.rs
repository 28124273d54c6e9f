//! Model name to token counter registry.
//!
//! Exact counters are registered per model pattern, either directly or from a
//! JSON file of tokenizer sources. Models without a match fall back to the
//! heuristic counter.

use crate::budget::counter::{HeuristicTokenCounter, SharedTokenCounter};
use crate::budget::types::PackError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A tokenizer file registered for a model pattern (user configuration).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerSource {
    /// Model identifier (partial match supported, e.g., "llama-3" matches "llama-3-8b")
    pub model_pattern: String,
    /// Path to a HuggingFace `tokenizer.json`
    pub tokenizer_path: PathBuf,
}

/// Registry of token counters keyed by model pattern.
#[derive(Clone)]
pub struct CounterRegistry {
    counters: HashMap<String, SharedTokenCounter>,
    fallback: SharedTokenCounter,
}

impl CounterRegistry {
    /// Create an empty registry that estimates for every model.
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(HeuristicTokenCounter::default()))
    }

    /// Create an empty registry with a custom fallback counter.
    pub fn with_fallback(fallback: SharedTokenCounter) -> Self {
        Self {
            counters: HashMap::new(),
            fallback,
        }
    }

    /// Register a counter for a model pattern, replacing any previous one.
    pub fn register(&mut self, model_pattern: impl Into<String>, counter: SharedTokenCounter) {
        self.counters.insert(model_pattern.into(), counter);
    }

    /// Load a tokenizer file and register it.
    pub fn register_source(&mut self, source: &TokenizerSource) -> Result<(), PackError> {
        let counter = load_tokenizer(&source.tokenizer_path)?;
        self.register(source.model_pattern.clone(), counter);
        Ok(())
    }

    /// Load tokenizer sources from a JSON file (`[{"model_pattern", "tokenizer_path"}]`).
    ///
    /// Relative tokenizer paths are resolved against the file's directory.
    /// Returns the number of sources registered.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<usize, PackError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let sources: Vec<TokenizerSource> = serde_json::from_str(&content)
            .map_err(|e| PackError::Config(format!("{}: {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for source in &sources {
            let resolved = TokenizerSource {
                model_pattern: source.model_pattern.clone(),
                tokenizer_path: base.join(&source.tokenizer_path),
            };
            self.register_source(&resolved)?;
        }

        tracing::info!("Loaded {} tokenizer sources from {:?}", sources.len(), path);
        Ok(sources.len())
    }

    /// Get the counter registered for a model.
    ///
    /// # Matching Strategy
    /// 1. Exact match (highest priority)
    /// 2. Model contains pattern (e.g., "llama-3-8b" contains "llama-3")
    /// 3. Pattern contains model
    ///
    /// For partial matches, the longest (most specific) pattern wins.
    pub fn get(&self, model: &str) -> Option<SharedTokenCounter> {
        if let Some(counter) = self.counters.get(model) {
            return Some(Arc::clone(counter));
        }

        self.counters
            .iter()
            .filter(|(pattern, _)| model.contains(pattern.as_str()) || pattern.contains(model))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, counter)| Arc::clone(counter))
    }

    /// Counter for a model, falling back to the default when there is no model or no match.
    pub fn counter_for(&self, model: Option<&str>) -> SharedTokenCounter {
        match model.filter(|m| !m.is_empty()).and_then(|m| self.get(m)) {
            Some(counter) => counter,
            None => {
                if let Some(model) = model {
                    tracing::debug!("No exact counter for model {:?}, estimating", model);
                }
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Registered model patterns, sorted.
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = self.counters.keys().map(String::as_str).collect();
        patterns.sort_unstable();
        patterns
    }
}

impl Default for CounterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CounterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterRegistry")
            .field("patterns", &self.patterns())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "tokenizers")]
fn load_tokenizer(path: &Path) -> Result<SharedTokenCounter, PackError> {
    let counter = crate::budget::counter::TokenizerCounter::from_file(path)?;
    Ok(Arc::new(counter))
}

#[cfg(not(feature = "tokenizers"))]
fn load_tokenizer(path: &Path) -> Result<SharedTokenCounter, PackError> {
    Err(PackError::Config(format!(
        "cannot load tokenizer {}: built without the `tokenizers` feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::counter::TokenCounter;

    /// One token per whitespace-separated word, reported as exact.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count_text(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }

        fn is_exact(&self) -> bool {
            true
        }
    }

    #[test]
    fn unknown_model_falls_back_to_heuristic() {
        let registry = CounterRegistry::new();
        let counter = registry.counter_for(Some("unknown-model-xyz"));
        assert!(!counter.is_exact());
        assert!(!registry.counter_for(None).is_exact());
    }

    #[test]
    fn registry_finds_counter_by_exact_match() {
        let mut registry = CounterRegistry::new();
        registry.register("llama-3", Arc::new(WordCounter));

        let counter = registry.get("llama-3").expect("Should find llama-3");
        assert!(counter.is_exact());
        assert_eq!(counter.count_text("one two three"), 3);
    }

    #[test]
    fn registry_finds_counter_by_partial_match() {
        let mut registry = CounterRegistry::new();
        registry.register("llama-3", Arc::new(WordCounter));

        // "llama-3-8b-instruct" contains "llama-3"
        assert!(registry.counter_for(Some("llama-3-8b-instruct")).is_exact());
    }

    #[test]
    fn longest_pattern_wins() {
        struct Fixed(usize);
        impl TokenCounter for Fixed {
            fn count_text(&self, _: &str) -> usize {
                self.0
            }
            fn is_exact(&self) -> bool {
                true
            }
        }

        let mut registry = CounterRegistry::new();
        registry.register("gpt", Arc::new(Fixed(1)));
        registry.register("gpt-4o", Arc::new(Fixed(2)));

        let counter = registry.counter_for(Some("gpt-4o-mini"));
        assert_eq!(counter.count_text("anything"), 2);
    }

    #[test]
    fn empty_model_name_uses_fallback() {
        let mut registry = CounterRegistry::new();
        registry.register("llama", Arc::new(WordCounter));
        assert!(!registry.counter_for(Some("")).is_exact());
    }

    #[test]
    fn malformed_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizers.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut registry = CounterRegistry::new();
        let err = registry.load_config(&path).unwrap_err();
        assert!(matches!(err, PackError::Config(_)), "got {err:?}");
    }

    #[test]
    fn missing_config_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = CounterRegistry::new();
        let err = registry.load_config(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PackError::Io(_)), "got {err:?}");
    }

    #[test]
    fn empty_config_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizers.json");
        std::fs::write(&path, "[]").unwrap();

        let mut registry = CounterRegistry::new();
        assert_eq!(registry.load_config(&path).unwrap(), 0);
        assert!(registry.patterns().is_empty());
    }

    #[cfg(not(feature = "tokenizers"))]
    #[test]
    fn tokenizer_sources_require_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizers.json");
        std::fs::write(
            &path,
            r#"[{"model_pattern": "llama-3", "tokenizer_path": "llama3/tokenizer.json"}]"#,
        )
        .unwrap();

        let mut registry = CounterRegistry::new();
        let err = registry.load_config(&path).unwrap_err();
        assert!(err.to_string().contains("tokenizers"), "got {err}");
    }
}
