/// Full-width assistant message block.
pub mod ai_message;
/// Chat panel coordinator wiring list, input, provider, and persistence.
pub mod bubble_panel;
/// Event contracts for chat module wiring.
pub mod events;
/// Prompt composer.
pub mod input;
/// Domain entities and deterministic stream state boundaries.
pub mod message;
pub mod message_list;
pub mod scroll;
/// Right-aligned user message bubble.
pub mod user_message;

pub use ai_message::AIChatMessage;
pub use bubble_panel::ChatBubblePanel;
pub use events::{Stop, StreamEventMapped, StreamEventPayload, Submit};
pub use input::ChatInput;
pub use message::ChatMessage;
pub use message_list::ChatMessageList;
pub use user_message::UserChatMessage;

#[cfg(test)]
mod tests {
    use super::{
        AIChatMessage, ChatBubblePanel, ChatInput, ChatMessage, ChatMessageList, UserChatMessage,
    };
    use crate::chat::message::{MessageId, MessageStatus, Role};

    #[test]
    fn aggregator_surface_resolves_every_component_binding() {
        // Constructing a message and naming each component type exercises the
        // full re-export surface downstream code depends on.
        let message = ChatMessage::new(MessageId::new(1), Role::User, "hi", MessageStatus::Done);
        let _user_row = UserChatMessage::new(message.clone());
        let _assistant_row = AIChatMessage::new(message, 0);

        fn assert_named<T>() {}
        assert_named::<ChatMessageList>();
        assert_named::<ChatInput>();
        assert_named::<ChatBubblePanel>();
    }
}
