//! Packable items and the ordered store that owns them.
//!
//! # Key Components
//!
//! - [`types`]: `Role`, `ChatMessage`, `PackableItem` and the `ItemInfo` inspection record
//! - [`priority`]: priority tiers and the role-based default policy
//! - [`store`]: insertion-ordered item storage with a resettable counter

pub mod priority;
pub mod store;
pub mod types;

pub use priority::{
    priority_for_role, Priority, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_SYSTEM,
    PRIORITY_USER,
};
pub use store::ItemStore;
pub use types::{ChatMessage, ItemInfo, NewItem, PackableItem, Role};
