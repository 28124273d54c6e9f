//! Greedy budget selection.
//!
//! Items are visited in `(priority, insertion_index)` order and accepted while
//! their content plus format overhead still fits. There is no backtracking: a
//! skipped item is never reconsidered. The accepted subset is returned in
//! insertion order so renderers keep the natural reading flow.

use crate::budget::types::SelectionLimit;
use crate::item::PackableItem;

/// Result of a selection pass.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// Accepted items in insertion order
    pub items: Vec<&'a PackableItem>,
    /// Content plus overhead of the accepted items (0 in unlimited mode)
    pub tokens_used: usize,
    /// Items left out
    pub dropped: usize,
}

impl Selection<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Select the items that fit `limit`, charging `overhead(item)` on top of each item's tokens.
///
/// In unlimited mode every item is returned in insertion order and overhead is not computed.
pub fn greedy_select<'a, F>(
    items: &'a [PackableItem],
    limit: SelectionLimit,
    mut overhead: F,
) -> Selection<'a>
where
    F: FnMut(&PackableItem) -> usize,
{
    let max_tokens = match limit {
        SelectionLimit::Unlimited => {
            tracing::debug!("Unlimited mode: selected all {} items", items.len());
            return Selection {
                items: items.iter().collect(),
                tokens_used: 0,
                dropped: 0,
            };
        }
        SelectionLimit::Exhausted => {
            tracing::debug!(
                "Fixed reservations exceed the ceiling, dropping all {} items",
                items.len()
            );
            return Selection {
                items: Vec::new(),
                tokens_used: 0,
                dropped: items.len(),
            };
        }
        SelectionLimit::Tokens(max_tokens) => max_tokens,
    };

    let mut by_priority: Vec<&PackableItem> = items.iter().collect();
    by_priority.sort_by_key(|item| (item.priority(), item.insertion_index()));

    let mut selected: Vec<&PackableItem> = Vec::with_capacity(by_priority.len());
    let mut current_tokens: usize = 0;

    for item in by_priority {
        let item_overhead = overhead(item);
        let cost = item.tokens().saturating_add(item_overhead);

        match current_tokens.checked_add(cost) {
            Some(total) if total <= max_tokens => {
                current_tokens = total;
                selected.push(item);
                tracing::debug!(
                    "Selected item {}: {}+{} tokens (total: {}/{})",
                    item.insertion_index(),
                    item.tokens(),
                    item_overhead,
                    current_tokens,
                    max_tokens
                );
            }
            _ => {
                tracing::debug!(
                    "Dropped item {}: {}+{} tokens would exceed budget ({}/{})",
                    item.insertion_index(),
                    item.tokens(),
                    item_overhead,
                    current_tokens,
                    max_tokens
                );
            }
        }
    }

    // Restore insertion order
    selected.sort_by_key(|item| item.insertion_index());

    let dropped = items.len() - selected.len();
    Selection {
        items: selected,
        tokens_used: current_tokens,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemStore, Role};

    fn store_with(items: &[(&str, i32, usize)]) -> ItemStore {
        let mut store = ItemStore::new();
        for (content, priority, tokens) in items {
            store.push(content.to_string(), None, *priority, *tokens);
        }
        store
    }

    fn contents<'a>(selection: &Selection<'a>) -> Vec<&'a str> {
        selection.items.iter().map(|i| i.content()).collect()
    }

    #[test]
    fn unlimited_returns_everything_in_insertion_order() {
        let store = store_with(&[("low", 40, 100), ("sys", 0, 100), ("high", 20, 100)]);
        let selection = greedy_select(store.items(), SelectionLimit::Unlimited, |_| {
            panic!("overhead must not be computed in unlimited mode")
        });

        assert_eq!(contents(&selection), vec!["low", "sys", "high"]);
        assert_eq!(selection.dropped, 0);
        assert_eq!(selection.tokens_used, 0);
    }

    #[test]
    fn higher_priority_wins_when_budget_is_tight() {
        let store = store_with(&[("sys", 0, 5), ("low", 40, 5), ("high", 20, 5)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(10), |_| 0);

        assert_eq!(contents(&selection), vec!["sys", "high"]);
        assert_eq!(selection.tokens_used, 10);
        assert_eq!(selection.dropped, 1);
    }

    #[test]
    fn equal_priorities_prefer_earlier_items() {
        let store = store_with(&[("first", 30, 4), ("second", 30, 4), ("third", 30, 4)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(8), |_| 0);

        assert_eq!(contents(&selection), vec!["first", "second"]);
    }

    #[test]
    fn overhead_counts_against_budget() {
        let store = store_with(&[("a", 20, 3), ("b", 20, 3)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(8), |_| 2);

        assert_eq!(contents(&selection), vec!["a"]);
        assert_eq!(selection.tokens_used, 5);
    }

    #[test]
    fn skipped_items_do_not_stop_the_pass() {
        // The big item is skipped, later small items still fit.
        let store = store_with(&[("big", 10, 50), ("small", 20, 2), ("tiny", 30, 1)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(5), |_| 0);

        assert_eq!(contents(&selection), vec!["small", "tiny"]);
    }

    #[test]
    fn selection_restores_insertion_order() {
        let store = store_with(&[("doc", 20, 1), ("query", 10, 1), ("system", 0, 1)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(100), |_| 0);

        assert_eq!(contents(&selection), vec!["doc", "query", "system"]);
    }

    #[test]
    fn exhausted_limit_selects_nothing() {
        let mut store = ItemStore::new();
        store.push(String::new(), Some(Role::System), 0, 0);
        let selection = greedy_select(store.items(), SelectionLimit::Exhausted, |_| 0);

        assert!(selection.is_empty());
        assert_eq!(selection.dropped, 1);
    }

    #[test]
    fn zero_budget_accepts_only_free_items() {
        let store = store_with(&[("", 0, 0), ("x", 0, 1)]);
        let selection = greedy_select(store.items(), SelectionLimit::Tokens(0), |_| 0);

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.items[0].content(), "");
    }

    #[test]
    fn empty_store_selects_nothing() {
        let selection = greedy_select(&[], SelectionLimit::Tokens(10), |_| 0);
        assert!(selection.is_empty());
        assert_eq!(selection.dropped, 0);
    }
}
