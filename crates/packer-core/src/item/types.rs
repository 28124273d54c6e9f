use crate::refine::Refiner;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::priority::Priority;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Speaker label used in plain-text transcripts ("User", "Assistant").
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }

    /// Whether the role belongs to the conversation (as opposed to instructions).
    pub fn is_conversational(&self) -> bool {
        !matches!(self, Role::System)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role/content pair as consumed by chat-completion request bodies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A fragment awaiting packing.
///
/// `tokens` is the cost of `content` alone, counted once after refinement.
/// Format overhead is charged separately during selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackableItem {
    content: String,
    role: Option<Role>,
    priority: Priority,
    tokens: usize,
    insertion_index: usize,
}

impl PackableItem {
    pub(crate) fn new(
        content: String,
        role: Option<Role>,
        priority: Priority,
        tokens: usize,
        insertion_index: usize,
    ) -> Self {
        Self {
            content,
            role,
            priority,
            tokens,
            insertion_index,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn insertion_index(&self) -> usize {
        self.insertion_index
    }

    pub fn info(&self) -> ItemInfo {
        ItemInfo {
            priority: self.priority,
            tokens: self.tokens,
            insertion_index: self.insertion_index,
            role: self.role,
        }
    }
}

/// Item metadata for debugging and observability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemInfo {
    pub priority: Priority,
    pub tokens: usize,
    pub insertion_index: usize,
    pub role: Option<Role>,
}

/// An item before ingestion: raw content plus the refiners to run on it.
pub struct NewItem {
    pub(crate) content: String,
    pub(crate) role: Option<Role>,
    pub(crate) priority: Option<Priority>,
    pub(crate) refiners: Vec<Box<dyn Refiner>>,
}

impl NewItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: None,
            priority: None,
            refiners: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content).role(Role::System)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content).role(Role::User)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content).role(Role::Assistant)
    }

    /// An untagged context document (retrieval result).
    pub fn context(content: impl Into<String>) -> Self {
        Self::new(content)
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn maybe_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn maybe_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Append a refine operation. Operations run in the order they were added.
    pub fn refine_with(mut self, refiner: impl Refiner + 'static) -> Self {
        self.refiners.push(Box::new(refiner));
        self
    }

    pub fn refine_with_boxed(mut self, refiner: Box<dyn Refiner>) -> Self {
        self.refiners.push(refiner);
        self
    }
}

impl fmt::Debug for NewItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewItem")
            .field("content", &self.content)
            .field("role", &self.role)
            .field("priority", &self.priority)
            .field("refiners", &self.refiners.len())
            .finish()
    }
}

impl From<&str> for NewItem {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for NewItem {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl From<ChatMessage> for NewItem {
    fn from(message: ChatMessage) -> Self {
        Self::new(message.content).role(message.role)
    }
}
