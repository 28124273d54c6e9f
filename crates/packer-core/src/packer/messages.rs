//! Message rendering for chat-completion APIs.

use super::Renderer;
use crate::budget::counter::TokenCounter;
use crate::item::{ChatMessage, PackableItem, Role};

/// Tokens every chat message wrapper costs regardless of content
/// (`<|im_start|>role\n ... <|im_end|>`).
pub const PER_MESSAGE_OVERHEAD: usize = 4;

/// Renders each selected item as a `{role, content}` message.
///
/// Items without a role are sent as `user` messages.
#[derive(Debug, Clone, Default)]
pub struct MessageRenderer;

impl MessageRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for MessageRenderer {
    type Output = Vec<ChatMessage>;

    fn name(&self) -> &'static str {
        "messages"
    }

    fn overhead(&self, _item: &PackableItem, _counter: &dyn TokenCounter) -> usize {
        PER_MESSAGE_OVERHEAD
    }

    fn render(&self, items: &[&PackableItem]) -> Vec<ChatMessage> {
        items
            .iter()
            .map(|item| ChatMessage::new(item.role().unwrap_or(Role::User), item.content()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{
        NewItem, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_SYSTEM, PRIORITY_USER,
    };
    use crate::packer::{MessagesPacker, PackerConfig};

    fn packer(max_tokens: usize) -> MessagesPacker {
        MessagesPacker::new(&PackerConfig::new().with_max_tokens(max_tokens)).unwrap()
    }

    #[test]
    fn packs_basic_messages() {
        let mut packer = packer(100);
        packer
            .add(NewItem::system("System prompt").priority(PRIORITY_SYSTEM))
            .unwrap()
            .add(NewItem::user("User query").priority(PRIORITY_USER))
            .unwrap();

        let messages = packer.pack();
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("System prompt"),
                ChatMessage::user("User query")
            ]
        );
    }

    #[test]
    fn untagged_items_become_user_messages() {
        let mut packer = packer(100);
        packer
            .add(NewItem::context("No role specified").priority(PRIORITY_HIGH))
            .unwrap();

        let messages = packer.pack();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "No role specified");
    }

    #[test]
    fn keeps_insertion_order() {
        let mut packer = packer(100);
        for content in ["first", "second", "third"] {
            packer
                .add(NewItem::user(content).priority(PRIORITY_MEDIUM))
                .unwrap();
        }

        let contents: Vec<String> = packer.pack().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_packer_returns_empty_list() {
        assert!(packer(100).pack().is_empty());
    }

    #[test]
    fn per_message_overhead_is_charged() {
        // effective budget 9; "hi" = 1 token + 4 overhead = 5 per message
        let mut packer = packer(10);
        packer.add(NewItem::user("hi")).unwrap();
        packer.add(NewItem::user("hi")).unwrap();

        let packed = packer.pack_with_usage();
        assert_eq!(packed.output.len(), 1);
        assert_eq!(packed.usage.tokens_used, 5);
    }

    #[test]
    fn history_is_dropped_before_current_turn() {
        let mut packer = packer(35);
        packer.add(NewItem::system("You are a chatbot.")).unwrap();
        packer.add_messages(
            vec![
                ChatMessage::user("Old user message"),
                ChatMessage::assistant("Old bot response"),
            ],
            Some(PRIORITY_LOW),
        );
        packer.add(NewItem::user("Recent user message")).unwrap();

        // effective 31: system 5+4, recent 5+4 = 18; each old message 4+4 = 8 -> one fits
        let contents: Vec<String> = packer.pack().into_iter().map(|m| m.content).collect();
        assert_eq!(
            contents,
            vec!["You are a chatbot.", "Old user message", "Recent user message"]
        );
    }

    #[test]
    fn budget_enforcement_keeps_some_messages() {
        let mut packer = packer(30);
        for i in 0..10 {
            packer
                .add(NewItem::user(format!("Message {i}")).priority(PRIORITY_MEDIUM))
                .unwrap();
        }

        let messages = packer.pack();
        assert!(!messages.is_empty());
        assert!(messages.len() < 10);
    }
}
