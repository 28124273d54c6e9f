//! Insertion-ordered item storage.

use super::priority::Priority;
use super::types::{ItemInfo, PackableItem, Role};

/// Ordered, append-only collection of packable items.
///
/// Insertion indices are unique and strictly increasing until [`ItemStore::clear`],
/// which restarts them at zero.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<PackableItem>,
    next_index: usize,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item, assigning it the next insertion index.
    pub fn push(
        &mut self,
        content: String,
        role: Option<Role>,
        priority: Priority,
        tokens: usize,
    ) -> &PackableItem {
        let item = PackableItem::new(content, role, priority, tokens, self.next_index);
        self.next_index += 1;
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub fn items(&self) -> &[PackableItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn infos(&self) -> Vec<ItemInfo> {
        self.items.iter().map(PackableItem::info).collect()
    }

    /// Remove every item and restart insertion indices at zero.
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_index = 0;
    }
}
