//! Reactive view of a room.

use std::collections::HashSet;

use tokio::sync::watch;

use tutorhub_core::types::UserId;
use tutorhub_entity::presence::EnrichedPresence;

/// What a session currently knows about the other users in its room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSnapshot {
    /// Every other user with a record in the room, online first.
    pub others: Vec<EnrichedPresence>,
    /// `true` until the first query result arrives.
    pub is_loading: bool,
}

impl RoomSnapshot {
    /// Snapshot before anything is known.
    pub fn loading() -> Self {
        Self {
            others: Vec::new(),
            is_loading: true,
        }
    }

    /// Snapshot from a query result.
    pub fn from_others(others: Vec<EnrichedPresence>) -> Self {
        Self {
            others,
            is_loading: false,
        }
    }

    /// Users currently online.
    pub fn online_presence(&self) -> impl Iterator<Item = &EnrichedPresence> {
        self.others.iter().filter(|p| p.is_online)
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.online_presence().count()
    }

    /// Whether `user_id` is online in this room.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some_and(|p| p.is_online)
    }

    /// Whether `user_id` is online and typing.
    pub fn is_typing(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some_and(EnrichedPresence::is_typing)
    }

    /// Display names of everyone online and typing.
    pub fn typing_users(&self) -> Vec<String> {
        self.others
            .iter()
            .filter(|p| p.is_typing())
            .map(|p| p.user_name.clone())
            .collect()
    }

    /// Presence of one user, if they have a record here.
    pub fn get(&self, user_id: UserId) -> Option<&EnrichedPresence> {
        self.others.iter().find(|p| p.user_id == user_id)
    }
}

/// Union of a narrow room (one conversation) and a wide room (the whole
/// messages section): a user online in either counts as online.
#[derive(Debug, Clone)]
pub struct DualRoomPresence {
    narrow: watch::Receiver<RoomSnapshot>,
    wide: watch::Receiver<RoomSnapshot>,
}

impl DualRoomPresence {
    /// Combine two session views.
    pub fn new(narrow: watch::Receiver<RoomSnapshot>, wide: watch::Receiver<RoomSnapshot>) -> Self {
        Self { narrow, wide }
    }

    /// Whether `user_id` is online in either room.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.narrow.borrow().is_online(user_id) || self.wide.borrow().is_online(user_id)
    }

    /// Online users across both rooms, each listed once. Narrow-room
    /// entries win when a user appears in both.
    pub fn online_users(&self) -> Vec<EnrichedPresence> {
        let narrow = self.narrow.borrow();
        let wide = self.wide.borrow();

        let mut seen = HashSet::new();
        narrow
            .online_presence()
            .chain(wide.online_presence())
            .filter(|p| seen.insert(p.user_id))
            .cloned()
            .collect()
    }

    /// Typing is scoped to the narrow room.
    pub fn typing_users(&self) -> Vec<String> {
        self.narrow.borrow().typing_users()
    }

    /// `true` while either room has not loaded yet.
    pub fn is_loading(&self) -> bool {
        self.narrow.borrow().is_loading || self.wide.borrow().is_loading
    }

    /// Wait until either room view changes.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.narrow.changed() => res.is_ok(),
            res = self.wide.changed() => res.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(user_id: UserId, name: &str, data: &str, is_online: bool) -> EnrichedPresence {
        EnrichedPresence {
            user_id,
            user_name: name.to_string(),
            data: data.to_string(),
            last_seen: 0,
            is_online,
        }
    }

    #[test]
    fn test_derived_views() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let snap = RoomSnapshot::from_others(vec![
            presence(a, "Ada", r#"{"typing":true}"#, true),
            presence(b, "Bob", r#"{"typing":true}"#, false),
            presence(c, "Cy", "garbage", true),
        ]);

        assert!(!snap.is_loading);
        assert_eq!(snap.online_count(), 2);
        assert!(snap.is_online(a));
        assert!(!snap.is_online(b));
        assert!(snap.is_typing(a));
        assert!(!snap.is_typing(b), "typing requires online");
        assert!(!snap.is_typing(c), "malformed blob reads as not typing");
        assert_eq!(snap.typing_users(), vec!["Ada"]);
        assert!(!snap.is_online(UserId::new()));
    }

    #[test]
    fn test_loading_snapshot_is_empty() {
        let snap = RoomSnapshot::loading();
        assert!(snap.is_loading);
        assert_eq!(snap.online_count(), 0);
        assert!(snap.typing_users().is_empty());
    }

    #[test]
    fn test_dual_room_is_union() {
        let a = UserId::new();
        let b = UserId::new();
        let (narrow_tx, narrow_rx) = watch::channel(RoomSnapshot::from_others(vec![presence(
            a, "Ada", "{}", false,
        )]));
        let (_wide_tx, wide_rx) = watch::channel(RoomSnapshot::from_others(vec![
            presence(a, "Ada", "{}", true),
            presence(b, "Bob", "{}", true),
        ]));
        let dual = DualRoomPresence::new(narrow_rx, wide_rx);

        assert!(dual.is_online(a), "offline in narrow but online in wide");
        assert!(dual.is_online(b));
        assert_eq!(dual.online_users().len(), 2);

        narrow_tx.send_replace(RoomSnapshot::from_others(vec![
            presence(a, "Ada", r#"{"typing":true}"#, true),
            presence(b, "Bob", "{}", true),
        ]));
        assert_eq!(dual.online_users().len(), 2);
        assert_eq!(dual.typing_users(), vec!["Ada"]);
    }
}
