use super::{RefineError, Refiner};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (including newlines) into one space and trim the ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeWhitespace;

impl NormalizeWhitespace {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, text: &str) -> String {
        WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
    }
}

impl Refiner for NormalizeWhitespace {
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        Ok(self.normalize(text))
    }
}
