//! Packers: the shared budget engine parameterized by a renderer.
//!
//! A [`Renderer`] knows two things about its destination format: the token
//! overhead each item adds, and how to assemble the selected items. The
//! [`Packer`] owns the items and the budget, runs the greedy selection with the
//! renderer's overhead, then hands the insertion-ordered subset to `render`.
//!
//! # Key Components
//!
//! - [`config`]: `PackerConfig`, the configuration surface
//! - [`messages`]: `MessageRenderer` for chat-completion APIs
//! - [`text`]: `TextRenderer` for completion APIs (raw, markdown, xml)

pub mod config;
pub mod messages;
pub mod text;

use crate::budget::counter::{SharedTokenCounter, TokenCounter};
use crate::budget::registry::CounterRegistry;
use crate::budget::selection::{greedy_select, Selection};
use crate::budget::types::{PackError, PackUsage, Packed, TokenBudget};
use crate::item::{
    priority_for_role, ChatMessage, ItemInfo, ItemStore, NewItem, PackableItem, Priority,
    PRIORITY_LOW,
};
use crate::refine::apply_all;

pub use config::{PackerConfig, DEFAULT_SEPARATOR};
pub use messages::{MessageRenderer, PER_MESSAGE_OVERHEAD};
pub use text::{TextFormat, TextRenderer};

/// Destination format of a packer.
pub trait Renderer {
    type Output;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fixed cost deducted from the ceiling once, independent of item count.
    fn reserved_tokens(&self) -> usize {
        0
    }

    /// Format tokens the item adds on top of its content.
    fn overhead(&self, item: &PackableItem, counter: &dyn TokenCounter) -> usize;

    /// Assemble the selected items, given in insertion order.
    fn render(&self, items: &[&PackableItem]) -> Self::Output;
}

/// Packs prioritized items into a token budget and renders them.
///
/// A packer is a single-owner, synchronous object: one per request or session.
pub struct Packer<R: Renderer> {
    renderer: R,
    counter: SharedTokenCounter,
    budget: TokenBudget,
    store: ItemStore,
}

/// Packer for chat-completion APIs.
pub type MessagesPacker = Packer<MessageRenderer>;

/// Packer for completion (raw text) APIs.
pub type TextPacker = Packer<TextRenderer>;

impl<R: Renderer> Packer<R> {
    /// Create a packer with an explicit token counter.
    ///
    /// The counter's exactness decides the safety margin: approximate counters
    /// only get 90% of `max_tokens`.
    pub fn with_counter(renderer: R, max_tokens: Option<usize>, counter: SharedTokenCounter) -> Self {
        let mut budget = TokenBudget::new(max_tokens, counter.is_exact());
        let reserved = renderer.reserved_tokens();
        if reserved > 0 {
            budget.reserve(reserved);
        }

        tracing::debug!(
            "{} packer initialized with {:?} tokens (effective: {:?}, reserved: {})",
            renderer.name(),
            budget.max_tokens,
            budget.effective_max_tokens,
            budget.reserved_tokens
        );

        Self {
            renderer,
            counter,
            budget,
            store: ItemStore::new(),
        }
    }

    /// Create a packer whose counter is looked up by model name.
    pub fn with_registry(
        renderer: R,
        max_tokens: Option<usize>,
        model: Option<&str>,
        registry: &CounterRegistry,
    ) -> Self {
        Self::with_counter(renderer, max_tokens, registry.counter_for(model))
    }

    /// Add an item.
    ///
    /// Refiners run first, in order; the refined content is counted once and
    /// stored with the next insertion index. Without an explicit priority one is
    /// inferred from the role. A failing refiner leaves the packer unchanged.
    pub fn add(&mut self, item: impl Into<NewItem>) -> Result<&mut Self, PackError> {
        let NewItem {
            content,
            role,
            priority,
            refiners,
        } = item.into();

        let content = if refiners.is_empty() {
            content
        } else {
            apply_all(&refiners, &content)?
        };

        let priority = priority.unwrap_or_else(|| priority_for_role(role.as_ref()));
        self.push(content, role, priority);
        Ok(self)
    }

    /// Add a batch of messages with one shared priority (default: LOW).
    ///
    /// Conversation history is usually the first thing to drop, hence the default.
    pub fn add_messages<I>(&mut self, messages: I, priority: Option<Priority>) -> &mut Self
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let priority = priority.unwrap_or(PRIORITY_LOW);
        for message in messages {
            self.push(message.content, Some(message.role), priority);
        }
        self
    }

    fn push(&mut self, content: String, role: Option<crate::item::Role>, priority: Priority) {
        let tokens = self.counter.count_text(&content);
        let item = self.store.push(content, role, priority, tokens);
        tracing::debug!(
            "Added item {}: {} tokens, priority={}, role={:?}",
            item.insertion_index(),
            tokens,
            priority,
            role
        );
    }

    /// Remove all items; the packer then behaves as freshly constructed.
    pub fn reset(&mut self) -> &mut Self {
        self.store.clear();
        tracing::debug!("Packer reset");
        self
    }

    /// Metadata for every added item, selected or not.
    pub fn items(&self) -> Vec<ItemInfo> {
        self.store.infos()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Count tokens with this packer's counter.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count_text(text)
    }

    /// Run the greedy selection without rendering.
    pub fn select(&self) -> Selection<'_> {
        let counter = self.counter.as_ref();
        greedy_select(self.store.items(), self.budget.limit(), |item| {
            self.renderer.overhead(item, counter)
        })
    }

    /// Select and render. Packing does not mutate the packer.
    pub fn pack(&self) -> R::Output {
        self.pack_with_usage().output
    }

    /// Select and render, reporting token usage alongside the output.
    pub fn pack_with_usage(&self) -> Packed<R::Output> {
        let selection = self.select();

        if selection.is_empty() && !self.store.is_empty() {
            tracing::warn!(
                "No items selected out of {}, rendering empty {} output",
                self.store.len(),
                self.renderer.name()
            );
        }

        let usage = PackUsage {
            items_total: self.store.len(),
            items_selected: selection.len(),
            items_dropped: selection.dropped,
            tokens_used: selection.tokens_used,
            reserved_tokens: self.budget.reserved_tokens,
            max_tokens: self.budget.max_tokens,
            effective_max_tokens: self.budget.effective_max_tokens,
        };

        match self.budget.effective_max_tokens {
            Some(limit) => tracing::info!(
                "Packed {}/{} items using {}/{} tokens ({})",
                usage.items_selected,
                usage.items_total,
                usage.tokens_used.saturating_add(usage.reserved_tokens),
                limit,
                self.renderer.name()
            ),
            None => tracing::info!(
                "Unlimited mode: packed all {} items ({})",
                usage.items_total,
                self.renderer.name()
            ),
        }

        Packed {
            output: self.renderer.render(&selection.items),
            usage,
        }
    }
}

impl<R: Renderer + std::fmt::Debug> std::fmt::Debug for Packer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packer")
            .field("renderer", &self.renderer)
            .field("exact_counting", &self.counter.is_exact())
            .field("budget", &self.budget)
            .field("items", &self.store.len())
            .finish()
    }
}

impl MessagesPacker {
    /// Create a message packer from configuration, using the default counter registry.
    pub fn new(config: &PackerConfig) -> Result<Self, PackError> {
        Self::from_config(config, &CounterRegistry::default())
    }

    pub fn from_config(config: &PackerConfig, registry: &CounterRegistry) -> Result<Self, PackError> {
        let max_tokens = config.validated_max_tokens()?;
        Ok(Self::with_registry(
            MessageRenderer::new(),
            max_tokens,
            config.model.as_deref(),
            registry,
        ))
    }
}

impl TextPacker {
    /// Create a text packer from configuration, using the default counter registry.
    pub fn new(config: &PackerConfig) -> Result<Self, PackError> {
        Self::from_config(config, &CounterRegistry::default())
    }

    pub fn from_config(config: &PackerConfig, registry: &CounterRegistry) -> Result<Self, PackError> {
        let max_tokens = config.validated_max_tokens()?;
        let renderer = TextRenderer::new(config.text_format, config.separator());
        Ok(Self::with_registry(
            renderer,
            max_tokens,
            config.model.as_deref(),
            registry,
        ))
    }
}
