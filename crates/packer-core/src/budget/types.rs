//! Core types for token budget management.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of the raw ceiling usable when token counts are estimated (90%).
const ESTIMATION_BUDGET_NUMERATOR: usize = 9;
const ESTIMATION_BUDGET_DENOMINATOR: usize = 10;

/// Token ceiling for one packer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Caller-supplied ceiling; `None` means unlimited
    pub max_tokens: Option<usize>,
    /// Ceiling after the estimation safety margin
    pub effective_max_tokens: Option<usize>,
    /// Fixed format costs deducted up front (section headers)
    pub reserved_tokens: usize,
}

impl TokenBudget {
    /// Derive the effective ceiling from the raw one.
    ///
    /// Approximate counters only get 90% of the raw ceiling; exact counters get all of it.
    pub fn new(max_tokens: Option<usize>, exact_counting: bool) -> Self {
        let effective_max_tokens = max_tokens.map(|max| {
            if exact_counting {
                max
            } else {
                apply_estimation_margin(max)
            }
        });

        match (max_tokens, effective_max_tokens) {
            (None, _) => tracing::debug!("Unlimited mode: all items will be included"),
            (Some(max), Some(effective)) if !exact_counting => tracing::debug!(
                "Using estimation mode with 10% safety buffer: {}/{}",
                effective,
                max
            ),
            (Some(max), _) => tracing::debug!("Using exact token counting: {} tokens", max),
        }

        Self {
            max_tokens,
            effective_max_tokens,
            reserved_tokens: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            max_tokens: None,
            effective_max_tokens: None,
            reserved_tokens: 0,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.effective_max_tokens.is_none()
    }

    /// Deduct a fixed cost from the ceiling once, before any selection happens.
    ///
    /// Has no effect in unlimited mode.
    pub fn reserve(&mut self, tokens: usize) {
        if self.is_unlimited() {
            return;
        }
        self.reserved_tokens = self.reserved_tokens.saturating_add(tokens);
        tracing::debug!(
            "Reserved {} tokens for fixed format costs, available: {:?}",
            tokens,
            self.limit()
        );
    }

    /// The ceiling the greedy pass works against.
    pub fn limit(&self) -> SelectionLimit {
        match self.effective_max_tokens {
            None => SelectionLimit::Unlimited,
            Some(effective) => match effective.checked_sub(self.reserved_tokens) {
                Some(available) => SelectionLimit::Tokens(available),
                None => SelectionLimit::Exhausted,
            },
        }
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// floor(max * 9 / 10) without overflowing for huge ceilings.
fn apply_estimation_margin(max: usize) -> usize {
    max / ESTIMATION_BUDGET_DENOMINATOR * ESTIMATION_BUDGET_NUMERATOR
        + max % ESTIMATION_BUDGET_DENOMINATOR * ESTIMATION_BUDGET_NUMERATOR
            / ESTIMATION_BUDGET_DENOMINATOR
}

/// Ceiling handed to the greedy selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionLimit {
    /// No ceiling: every item is selected
    Unlimited,
    /// At most this many tokens (content + overhead)
    Tokens(usize),
    /// Fixed reservations already exceed the ceiling: nothing fits
    Exhausted,
}

/// Token usage of one pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackUsage {
    /// Items in the store
    pub items_total: usize,
    /// Items that made it into the output
    pub items_selected: usize,
    /// Items dropped for lack of budget
    pub items_dropped: usize,
    /// Content plus per-item overhead of the selected items (0 in unlimited mode)
    pub tokens_used: usize,
    /// Fixed format cost deducted from the ceiling
    pub reserved_tokens: usize,
    /// Caller-supplied ceiling
    pub max_tokens: Option<usize>,
    /// Ceiling after the safety margin, before reservations
    pub effective_max_tokens: Option<usize>,
}

impl PackUsage {
    /// Percentage of the effective ceiling consumed, including reservations.
    pub fn usage_percentage(&self) -> f64 {
        match self.effective_max_tokens {
            None | Some(0) => 0.0,
            Some(limit) => {
                let used = self.tokens_used.saturating_add(self.reserved_tokens);
                (used as f64 / limit as f64) * 100.0
            }
        }
    }

    pub fn truncation_occurred(&self) -> bool {
        self.items_dropped > 0
    }
}

/// Output of a pack together with its usage report.
#[derive(Debug, Clone, PartialEq)]
pub struct Packed<T> {
    pub output: T,
    pub usage: PackUsage,
}

/// Errors surfaced to callers. Budget overflow is never one of them.
#[derive(Debug, Error)]
pub enum PackError {
    /// Ceiling was negative
    #[error("Invalid token budget {0}: max_tokens must be a non-negative integer")]
    InvalidBudget(i64),

    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid packer configuration: {0}")]
    Config(String),

    /// A refine operation failed; passed through as-is
    #[error(transparent)]
    Refine(#[from] crate::refine::RefineError),

    /// Tokenizer definition could not be loaded
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
