//! Token budget management for packing.
//!
//! # Key Components
//!
//! - [`types`]: `TokenBudget`, `SelectionLimit`, `PackUsage`, `PackError`
//! - [`counter`]: Token counting via heuristic estimation or a real tokenizer
//! - [`registry`]: Model name to token counter lookup
//! - [`selection`]: The greedy priority-ordered selection pass

pub mod counter;
pub mod registry;
pub mod selection;
pub mod types;

#[cfg(feature = "tokenizers")]
pub use counter::TokenizerCounter;
pub use counter::{HeuristicTokenCounter, SharedTokenCounter, TokenCounter};
pub use registry::{CounterRegistry, TokenizerSource};
pub use selection::{greedy_select, Selection};
pub use types::{PackError, PackUsage, Packed, SelectionLimit, TokenBudget};
