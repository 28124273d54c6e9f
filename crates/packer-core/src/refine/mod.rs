//! Refine operations applied to content before it is counted and stored.
//!
//! A refiner is any `text -> text` transform. Closures `Fn(&str) -> String`
//! are refiners; fallible operations implement [`Refiner`] directly and
//! return a [`RefineError`], which `Packer::add` passes through unchanged.

pub mod html;
pub mod truncate;
pub mod unicode;
pub mod whitespace;

use std::fmt;
use thiserror::Error;

pub use html::StripHtml;
pub use truncate::{TruncateStrategy, TruncateTokens};
pub use unicode::FixUnicode;
pub use whitespace::NormalizeWhitespace;

/// A refine operation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Refine operation '{operation}' failed: {message}")]
pub struct RefineError {
    pub operation: String,
    pub message: String,
}

impl RefineError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// A stateless text transform.
pub trait Refiner: Send + Sync {
    fn refine(&self, text: &str) -> Result<String, RefineError>;
}

impl<F> Refiner for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        Ok(self(text))
    }
}

/// Ordered chain of refiners; itself a refiner.
#[derive(Default)]
pub struct RefinePipeline {
    steps: Vec<Box<dyn Refiner>>,
}

impl RefinePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Steps run in the order they are piped.
    pub fn pipe(mut self, refiner: impl Refiner + 'static) -> Self {
        self.steps.push(Box::new(refiner));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(&self, text: &str) -> Result<String, RefineError> {
        apply_all(&self.steps, text)
    }
}

impl Refiner for RefinePipeline {
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        self.run(text)
    }
}

impl fmt::Debug for RefinePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinePipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Apply refiners in sequence.
pub(crate) fn apply_all(refiners: &[Box<dyn Refiner>], text: &str) -> Result<String, RefineError> {
    let mut current = text.to_string();
    for refiner in refiners {
        current = refiner.refine(&current)?;
    }
    Ok(current)
}

/// Look up a built-in refine operation by its snake_case name.
pub fn builtin(name: &str) -> Option<Box<dyn Refiner>> {
    match name {
        "strip_html" => Some(Box::new(StripHtml::new())),
        "strip_html_markdown" => Some(Box::new(StripHtml::new().to_markdown(true))),
        "normalize_whitespace" => Some(Box::new(NormalizeWhitespace::new())),
        "fix_unicode" => Some(Box::new(FixUnicode::new())),
        _ => None,
    }
}
