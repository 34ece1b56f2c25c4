//! Model-gateway trait and history conversion helpers.

pub mod provider;

use ayla_types::conversation::Message;
use ayla_types::llm::ChatTurn;

/// Convert stored messages into the gateway's history representation.
pub fn to_chat_turns(messages: &[Message]) -> Vec<ChatTurn> {
    messages
        .iter()
        .map(|m| ChatTurn {
            sender: m.sender,
            content: m.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayla_types::conversation::Sender;
    use uuid::Uuid;

    #[test]
    fn test_to_chat_turns_preserves_order_and_sender() {
        let conv = Uuid::now_v7();
        let messages = vec![
            Message::user(conv, "first".to_string()),
            Message::assistant(conv, "second".to_string(), "m".to_string(), 1, 1),
        ];

        let turns = to_chat_turns(&messages);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].sender, Sender::User);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].sender, Sender::Assistant);
    }
}
