//! Priority tiers. Lower values are more important.

use super::types::Role;

/// Item priority. Callers may use any integer; the named tiers below define the convention.
pub type Priority = i32;

/// Absolute must-have content (system prompts).
pub const PRIORITY_SYSTEM: Priority = 0;
/// The current user input.
pub const PRIORITY_USER: Priority = 10;
/// Important context such as core retrieval documents.
pub const PRIORITY_HIGH: Priority = 20;
/// Normal priority (assistant turns, secondary documents).
pub const PRIORITY_MEDIUM: Priority = 30;
/// Optional content, first candidate for eviction (old history).
pub const PRIORITY_LOW: Priority = 40;

/// Default priority for an item added without an explicit one.
///
/// Untagged items are treated as retrieval documents.
pub fn priority_for_role(role: Option<&Role>) -> Priority {
    match role {
        Some(Role::System) => PRIORITY_SYSTEM,
        Some(Role::User) => PRIORITY_USER,
        None => PRIORITY_HIGH,
        Some(Role::Assistant) | Some(Role::Tool) => PRIORITY_MEDIUM,
    }
}
