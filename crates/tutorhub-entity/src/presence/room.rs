//! Room naming conventions.
//!
//! Rooms are opaque partition keys; these helpers only fix the names the
//! messaging screens agree on.

use std::fmt::Display;

/// Room shared by everyone on the messages section of the app.
pub const GLOBAL_MESSAGES_ROOM: &str = "global-messages";

/// Longest room name accepted from callers.
pub const MAX_ROOM_LEN: usize = 255;

/// Room scoped to a single conversation.
pub fn conversation_room(conversation_id: impl Display) -> String {
    format!("conversation-{conversation_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_room_name() {
        assert_eq!(conversation_room("k17abc"), "conversation-k17abc");
    }
}
