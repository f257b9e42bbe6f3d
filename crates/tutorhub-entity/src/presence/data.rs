//! The presence attribute blob.
//!
//! On the wire and in the store the blob is an opaque JSON string. Clients
//! keep it as a [`PresenceData`] and merge partial updates into it before
//! re-serializing the whole thing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Self-reported availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    /// Active in the app.
    Online,
    /// Connected but not paying attention.
    Away,
    /// Explicitly gone (set by `set_offline`).
    Offline,
}

impl OnlineStatus {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Known presence attributes plus any unknown ones, kept verbatim.
///
/// Every field is optional: a value of `None` means "not set", which is
/// what lets a partial update leave other attributes untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceData {
    /// The user has a non-empty draft in the message box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing: Option<bool>,
    /// Self-reported availability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OnlineStatus>,
    /// The user has a conversation open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_conversation: Option<bool>,
    /// The user is on the messages section of the app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_messages_page: Option<bool>,
    /// The user has joined this room's view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_room: Option<bool>,
    /// Conversation currently open, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Client-reported timestamp (epoch ms); informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    /// Attributes this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PresenceData {
    /// Empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict parse of a serialized blob.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Parse a serialized blob without ever failing.
    ///
    /// Only a blob that is not a JSON object reads as empty. Inside an
    /// object, a known attribute whose value does not fit its type (an
    /// unrecognised `status`, a string `typing`) is kept verbatim in
    /// [`extra`](Self::extra) and the rest of the blob is read normally.
    pub fn parse_lenient(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_map_lenient(map),
            _ => Self::default(),
        }
    }

    fn from_map_lenient(map: Map<String, Value>) -> Self {
        let mut data = Self::default();
        for (key, value) in map {
            let rejected = match key.as_str() {
                "typing" => fill(&mut data.typing, value),
                "status" => fill(&mut data.status, value),
                "inConversation" => fill(&mut data.in_conversation, value),
                "inMessagesPage" => fill(&mut data.in_messages_page, value),
                "inRoom" => fill(&mut data.in_room, value),
                "conversationId" => fill(&mut data.conversation_id, value),
                "lastSeen" => fill(&mut data.last_seen, value),
                _ => Some(value),
            };
            if let Some(value) = rejected {
                data.extra.insert(key, value);
            }
        }
        data
    }

    /// Serialize the whole blob.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Field-wise merge: every attribute set in `patch` overwrites the
    /// same attribute here, everything else is left alone.
    pub fn merge(&mut self, patch: PresenceData) {
        if patch.typing.is_some() {
            self.typing = patch.typing;
        }
        if patch.status.is_some() {
            self.status = patch.status;
        }
        if patch.in_conversation.is_some() {
            self.in_conversation = patch.in_conversation;
        }
        if patch.in_messages_page.is_some() {
            self.in_messages_page = patch.in_messages_page;
        }
        if patch.in_room.is_some() {
            self.in_room = patch.in_room;
        }
        if patch.conversation_id.is_some() {
            self.conversation_id = patch.conversation_id;
        }
        if patch.last_seen.is_some() {
            self.last_seen = patch.last_seen;
        }
        for key in patch.extra.keys() {
            self.clear_typed(key);
        }
        self.extra.extend(patch.extra);
        self.drop_shadowed();
    }

    /// An unparsed value arriving under a known key replaces the typed one.
    fn clear_typed(&mut self, key: &str) {
        match key {
            "typing" => self.typing = None,
            "status" => self.status = None,
            "inConversation" => self.in_conversation = None,
            "inMessagesPage" => self.in_messages_page = None,
            "inRoom" => self.in_room = None,
            "conversationId" => self.conversation_id = None,
            "lastSeen" => self.last_seen = None,
            _ => {}
        }
    }

    /// Typed fields win over an unparsed value under the same key.
    fn drop_shadowed(&mut self) {
        let set = [
            ("typing", self.typing.is_some()),
            ("status", self.status.is_some()),
            ("inConversation", self.in_conversation.is_some()),
            ("inMessagesPage", self.in_messages_page.is_some()),
            ("inRoom", self.in_room.is_some()),
            ("conversationId", self.conversation_id.is_some()),
            ("lastSeen", self.last_seen.is_some()),
        ];
        for (key, is_set) in set {
            if is_set {
                self.extra.remove(key);
            }
        }
    }

    /// Merge and return `self`, for building values inline.
    pub fn merged(mut self, patch: PresenceData) -> Self {
        self.merge(patch);
        self
    }

    /// Whether the typing flag is set.
    pub fn is_typing(&self) -> bool {
        self.typing == Some(true)
    }

    /// Set the typing flag.
    pub fn with_typing(mut self, typing: bool) -> Self {
        self.typing = Some(typing);
        self.drop_shadowed();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: OnlineStatus) -> Self {
        self.status = Some(status);
        self.drop_shadowed();
        self
    }

    /// Set the in-conversation marker.
    pub fn with_in_conversation(mut self, in_conversation: bool) -> Self {
        self.in_conversation = Some(in_conversation);
        self.drop_shadowed();
        self
    }

    /// Set the messages-page marker.
    pub fn with_in_messages_page(mut self, in_messages_page: bool) -> Self {
        self.in_messages_page = Some(in_messages_page);
        self.drop_shadowed();
        self
    }

    /// Set the in-room marker.
    pub fn with_in_room(mut self, in_room: bool) -> Self {
        self.in_room = Some(in_room);
        self.drop_shadowed();
        self
    }

    /// Set the open conversation.
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self.drop_shadowed();
        self
    }

    /// Set the client timestamp.
    pub fn with_last_seen(mut self, last_seen: i64) -> Self {
        self.last_seen = Some(last_seen);
        self.drop_shadowed();
        self
    }

    /// Set an attribute this version has no typed field for.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Store `value` in `slot` if it has the right type, else hand it back.
fn fill<T: DeserializeOwned>(slot: &mut Option<T>, value: Value) -> Option<Value> {
    match T::deserialize(&value) {
        Ok(typed) => {
            *slot = Some(typed);
            None
        }
        Err(_) => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_untouched_attributes() {
        let mut data = PresenceData::new().with_extra("a", json!(1));
        data.merge(PresenceData::new().with_extra("b", json!(2)));
        assert_eq!(data.extra.get("a"), Some(&json!(1)));
        assert_eq!(data.extra.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_merge_new_value_wins() {
        let mut data = PresenceData::new()
            .with_typing(true)
            .with_status(OnlineStatus::Online);
        data.merge(PresenceData::new().with_typing(false));
        assert_eq!(data.typing, Some(false));
        assert_eq!(data.status, Some(OnlineStatus::Online));
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let data = PresenceData::new()
            .with_in_messages_page(true)
            .with_conversation_id("c1")
            .with_status(OnlineStatus::Away);
        let value: Value = serde_json::from_str(&data.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"inMessagesPage": true, "conversationId": "c1", "status": "away"})
        );
    }

    #[test]
    fn test_unknown_attributes_survive() {
        let raw = r#"{"typing":true,"cursor":{"x":3},"inRoom":true}"#;
        let data = PresenceData::parse(raw).unwrap();
        assert!(data.is_typing());
        assert_eq!(data.in_room, Some(true));
        assert_eq!(data.extra.get("cursor"), Some(&json!({"x": 3})));

        let back: Value = serde_json::from_str(&data.to_json()).unwrap();
        assert_eq!(back["cursor"], json!({"x": 3}));
    }

    #[test]
    fn test_lenient_parse_of_garbage_is_empty() {
        assert_eq!(PresenceData::parse_lenient("not json"), PresenceData::new());
        assert_eq!(PresenceData::parse_lenient(""), PresenceData::new());
        assert_eq!(PresenceData::parse_lenient("[1,2]"), PresenceData::new());
    }

    #[test]
    fn test_empty_blob_serializes_to_empty_object() {
        assert_eq!(PresenceData::new().to_json(), "{}");
    }

    #[test]
    fn test_lenient_parse_keeps_fields_around_unknown_status() {
        let raw = r#"{"typing":true,"status":"busy","cursor":7}"#;
        let data = PresenceData::parse_lenient(raw);
        assert!(data.is_typing());
        assert_eq!(data.status, None);
        assert_eq!(data.extra.get("status"), Some(&json!("busy")));
        assert_eq!(data.extra.get("cursor"), Some(&json!(7)));

        let back: Value = serde_json::from_str(&data.to_json()).unwrap();
        assert_eq!(back, json!({"typing": true, "status": "busy", "cursor": 7}));
    }

    #[test]
    fn test_lenient_parse_keeps_mistyped_known_field() {
        let data = PresenceData::parse_lenient(r#"{"typing":"yes","inRoom":true}"#);
        assert_eq!(data.typing, None);
        assert_eq!(data.in_room, Some(true));
        assert_eq!(data.extra.get("typing"), Some(&json!("yes")));
    }

    #[test]
    fn test_typed_value_replaces_unparsed_one() {
        let data = PresenceData::parse_lenient(r#"{"status":"busy","cursor":7}"#)
            .with_status(OnlineStatus::Offline);
        let back: Value = serde_json::from_str(&data.to_json()).unwrap();
        assert_eq!(back, json!({"status": "offline", "cursor": 7}));

        let mut merged = PresenceData::parse_lenient(r#"{"typing":"yes"}"#);
        merged.merge(PresenceData::new().with_typing(false));
        let back: Value = serde_json::from_str(&merged.to_json()).unwrap();
        assert_eq!(back, json!({"typing": false}));
    }
}
