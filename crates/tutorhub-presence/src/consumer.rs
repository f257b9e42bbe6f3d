//! Presence as the messages section uses it.
//!
//! The messages page keeps one session in the global messages room for as
//! long as the page is open. Each open conversation adds a session in that
//! conversation's room for typing indicators, and answers "is my partner
//! online" from both rooms.

use std::sync::Arc;

use tutorhub_core::Clock;
use tutorhub_core::types::UserId;
use tutorhub_entity::presence::{
    EnrichedPresence, GLOBAL_MESSAGES_ROOM, OnlineStatus, PresenceData, conversation_room,
};

use crate::client::{DualRoomPresence, PresenceApi, PresenceSession, RoomSnapshot, SessionTimings};

/// Presence of the current user on the messages page.
#[derive(Debug)]
pub struct MessagesPagePresence {
    session: PresenceSession,
}

impl MessagesPagePresence {
    /// Join the global messages room as online.
    pub fn open(api: Arc<dyn PresenceApi>, clock: &dyn Clock, timings: SessionTimings) -> Self {
        let initial = PresenceData::new()
            .with_status(OnlineStatus::Online)
            .with_in_messages_page(true)
            .with_last_seen(clock.now_millis());
        Self {
            session: PresenceSession::start(api, GLOBAL_MESSAGES_ROOM, initial, timings),
        }
    }

    /// Who else is on the messages page.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.session.snapshot()
    }

    /// Forward page visibility.
    pub fn set_visible(&self, visible: bool) {
        self.session.set_visible(visible);
    }

    /// Underlying session.
    pub fn session(&self) -> &PresenceSession {
        &self.session
    }

    /// Leave the page; marks the user offline in the global room.
    pub async fn close(self) {
        self.session.stop().await;
    }
}

/// Presence inside one open conversation.
#[derive(Debug)]
pub struct ConversationPresence {
    conversation_id: String,
    session: PresenceSession,
    dual: DualRoomPresence,
}

impl ConversationPresence {
    /// Join the conversation's room. `page` provides the wide room used
    /// for the partner's online state.
    pub fn open(
        api: Arc<dyn PresenceApi>,
        conversation_id: impl Into<String>,
        page: &MessagesPagePresence,
        timings: SessionTimings,
    ) -> Self {
        let conversation_id = conversation_id.into();
        let initial = PresenceData::new()
            .with_in_conversation(true)
            .with_conversation_id(conversation_id.clone());
        let session =
            PresenceSession::start(api, conversation_room(&conversation_id), initial, timings);
        session.enter_room();
        let dual = DualRoomPresence::new(session.watch(), page.session.watch());

        Self {
            conversation_id,
            session,
            dual,
        }
    }

    /// Conversation this view belongs to.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Report the message box contents.
    pub fn set_draft(&self, draft: &str) {
        self.session.set_draft(draft);
    }

    /// A message was sent.
    pub fn message_sent(&self) {
        self.session.message_sent();
    }

    /// Forward page visibility.
    pub fn set_visible(&self, visible: bool) {
        self.session.set_visible(visible);
    }

    /// Online in this conversation or anywhere on the messages page.
    pub fn is_partner_online(&self, partner: UserId) -> bool {
        self.dual.is_online(partner)
    }

    /// Online users across the conversation and the messages page.
    pub fn online_users(&self) -> Vec<EnrichedPresence> {
        self.dual.online_users()
    }

    /// Names of the users typing in this conversation.
    pub fn typing_users(&self) -> Vec<String> {
        self.dual.typing_users()
    }

    /// Combined view for callers that want to await changes.
    pub fn dual(&self) -> DualRoomPresence {
        self.dual.clone()
    }

    /// Underlying session.
    pub fn session(&self) -> &PresenceSession {
        &self.session
    }

    /// Leave the conversation.
    pub async fn close(self) {
        self.session.leave_room();
        self.session.stop().await;
    }
}
