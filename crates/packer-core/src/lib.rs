//! Priority-based token budget packing for LLM prompts.
//!
//! Items (system instructions, retrieved documents, conversation turns, the
//! current query) are added with a priority. When packing, items are selected
//! greedily by priority until the token ceiling is reached, then rendered in
//! their original order, either as chat messages or as a single text prompt.
//!
//! ```
//! use packer_core::{MessagesPacker, NewItem, PackerConfig};
//!
//! let mut packer = MessagesPacker::new(&PackerConfig::new().with_max_tokens(100))?;
//! packer
//!     .add(NewItem::system("You are helpful."))?
//!     .add(NewItem::context("Document about budgets"))?
//!     .add(NewItem::user("What is a token budget?"))?;
//!
//! let messages = packer.pack();
//! assert_eq!(messages.len(), 3);
//! # Ok::<(), packer_core::PackError>(())
//! ```

pub mod budget;
pub mod item;
pub mod packer;
pub mod refine;

#[cfg(feature = "tokenizers")]
pub use budget::TokenizerCounter;
pub use budget::{
    CounterRegistry, HeuristicTokenCounter, PackError, PackUsage, Packed, SelectionLimit,
    SharedTokenCounter, TokenBudget, TokenCounter, TokenizerSource,
};
pub use item::{
    priority_for_role, ChatMessage, ItemInfo, NewItem, PackableItem, Priority, Role,
    PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_SYSTEM, PRIORITY_USER,
};
pub use packer::{
    MessageRenderer, MessagesPacker, Packer, PackerConfig, Renderer, TextFormat, TextPacker,
    TextRenderer,
};
pub use refine::{
    FixUnicode, NormalizeWhitespace, RefineError, RefinePipeline, Refiner, StripHtml,
    TruncateStrategy, TruncateTokens,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
