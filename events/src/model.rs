//! Typed event records pushed by the real-time messaging stream.
//!
//! Every field is optional on the wire: an absent key decodes to the zero
//! value of its type (`""`, `0`, `false`). Unknown keys are ignored.

use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// DISCRIMINATOR
// =============================================================================

/// Name of each event variant, selected from the envelope's
/// `(type, subtype)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Hello,
    Pong,
    UserTyping,
    Message,
    MessageChanged,
    MessageDeleted,
    DesktopNotification,
    ReactionAdded,
    ReactionRemoved,
    Unknown,
}

impl EventKind {
    /// Pick the variant for an envelope. Never fails: anything unrecognised
    /// is [`EventKind::Unknown`].
    #[must_use]
    pub fn select(kind: &str, subtype: &str) -> Self {
        match (kind, subtype) {
            ("hello", _) => Self::Hello,
            ("pong", _) => Self::Pong,
            ("user_typing", _) => Self::UserTyping,
            ("message", "message_changed") => Self::MessageChanged,
            ("message", "message_deleted") => Self::MessageDeleted,
            ("message", _) => Self::Message,
            ("desktop_notification", _) => Self::DesktopNotification,
            ("reaction_added", _) => Self::ReactionAdded,
            ("reaction_removed", _) => Self::ReactionRemoved,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Pong => "pong",
            Self::UserTyping => "user_typing",
            Self::Message => "message",
            Self::MessageChanged => "message_changed",
            Self::MessageDeleted => "message_deleted",
            Self::DesktopNotification => "desktop_notification",
            Self::ReactionAdded => "reaction_added",
            Self::ReactionRemoved => "reaction_removed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EVENT
// =============================================================================

/// A decoded inbound event. Handed to the sink by value.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Hello,
    Pong(Pong),
    UserTyping(UserTyping),
    Message(Message),
    MessageChanged(MessageChanged),
    MessageDeleted(MessageDeleted),
    DesktopNotification(DesktopNotification),
    ReactionAdded(Reaction),
    ReactionRemoved(Reaction),
    Unknown(Unknown),
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Hello => EventKind::Hello,
            Self::Pong(_) => EventKind::Pong,
            Self::UserTyping(_) => EventKind::UserTyping,
            Self::Message(_) => EventKind::Message,
            Self::MessageChanged(_) => EventKind::MessageChanged,
            Self::MessageDeleted(_) => EventKind::MessageDeleted,
            Self::DesktopNotification(_) => EventKind::DesktopNotification,
            Self::ReactionAdded(_) => EventKind::ReactionAdded,
            Self::ReactionRemoved(_) => EventKind::ReactionRemoved,
            Self::Unknown(_) => EventKind::Unknown,
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Server acknowledgment of a liveness ping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pong {
    pub time: u64,
    pub reply_to: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserTyping {
    pub channel: String,
    pub user: String,
}

/// A plain channel message (any `message` subtype other than changed/deleted).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Message {
    pub client_msg_id: String,
    pub suppress_notification: bool,
    pub text: String,
    pub user: String,
    pub team: String,
    pub user_team: String,
    pub source_team: String,
    pub channel: String,
    pub event_ts: String,
    pub ts: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Edited {
    pub user: String,
    pub ts: String,
}

/// The new body of an edited message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditedMessage {
    pub client_msg_id: String,
    pub text: String,
    pub user: String,
    pub team: String,
    pub edited: Edited,
    pub user_team: String,
    pub source_team: String,
    pub channel: String,
    pub ts: String,
}

/// Snapshot of a message before it was edited or deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviousMessage {
    pub client_msg_id: String,
    pub text: String,
    pub user: String,
    pub team: String,
    pub ts: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageChanged {
    pub hidden: bool,
    pub message: EditedMessage,
    pub channel: String,
    pub previous_message: PreviousMessage,
    pub event_ts: String,
    pub ts: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageDeleted {
    pub hidden: bool,
    pub deleted_ts: String,
    pub channel: String,
    pub previous_message: PreviousMessage,
    pub event_ts: String,
    pub ts: String,
}

/// Notification the desktop client would raise. Some keys are camel-case
/// on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DesktopNotification {
    pub title: String,
    pub subtitle: String,
    pub msg: String,
    pub ts: String,
    pub content: String,
    pub channel: String,
    #[serde(rename = "launchUri")]
    pub launch_uri: String,
    #[serde(rename = "avatarImage")]
    pub avatar_image: String,
    #[serde(rename = "ssbFilename")]
    pub ssb_filename: String,
    #[serde(rename = "imageUri")]
    pub image_uri: String,
    pub is_shared: bool,
    pub is_channel_invite: bool,
    pub event_ts: String,
}

/// Message a reaction was attached to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReactionItem {
    pub channel: String,
    pub ts: String,
}

/// Shared shape of `reaction_added` and `reaction_removed`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Reaction {
    pub item: ReactionItem,
    pub user: String,
    pub reaction: String,
    pub item_user: String,
    pub event_ts: String,
    pub ts: String,
}

/// Catch-all for event types this client has no record shape for.
#[derive(Clone, Debug, PartialEq)]
pub struct Unknown {
    pub kind: String,
    pub subtype: String,
    pub raw: Value,
}
