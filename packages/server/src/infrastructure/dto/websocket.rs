//! WebSocket message DTOs for the consultation chat.
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<name>", "data": { ... }}` with camelCase payload fields.

use serde::{Deserialize, Serialize};

use crate::domain::StoredMessage;

/// Events sent by a client to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Register(RegisterPayload),
    StartConversation(StartConversationPayload),
    GetMessageHistory(RoomPayload),
    SendMessage(SendMessagePayload),
    MarkAsRead(MarkAsReadPayload),
    LeaveConversation(RoomPayload),
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Register(_) => "register",
            ClientEvent::StartConversation(_) => "startConversation",
            ClientEvent::GetMessageHistory(_) => "getMessageHistory",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::MarkAsRead(_) => "markAsRead",
            ClientEvent::LeaveConversation(_) => "leaveConversation",
        }
    }
}

/// Events sent by the relay to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    ConversationStarted(RoomPayload),
    MessageHistory(MessageHistoryPayload),
    NewMessage(MessageDto),
    MessagesRead(MessagesReadPayload),
    #[serde(rename = "user-joined")]
    UserJoined(NoticePayload),
    #[serde(rename = "user-left")]
    UserLeft(NoticePayload),
    Error(NoticePayload),
}

impl ServerEvent {
    /// Build an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(NoticePayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationPayload {
    pub target_user_id: String,
}

/// Payload carrying only a room id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    pub content: String,
    pub receiver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_nonce: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadPayload {
    pub room_id: String,
    pub message_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHistoryPayload {
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadPayload {
    pub message_ids: Vec<String>,
}

/// Human-readable notice (`user-joined`, `user-left`, `error`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticePayload {
    pub message: String,
}

/// A chat message as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    pub content: String,
    /// Unix timestamp (milliseconds since epoch), server clock
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_nonce: Option<String>,
}

impl From<&StoredMessage> for MessageDto {
    fn from(message: &StoredMessage) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            sender_id: message.sender.as_str().to_string(),
            receiver_id: Some(message.receiver.as_str().to_string()),
            content: message.content.as_str().to_string(),
            timestamp: message.timestamp.value(),
            is_read: message.is_read,
            client_nonce: message.client_nonce.as_ref().map(|n| n.as_str().to_string()),
        }
    }
}
