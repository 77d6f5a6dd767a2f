//! Messages as the chat screen holds them.

use mamalink_server::{
    domain::{MessageId, Timestamp, UserId, ValueObjectError},
    infrastructure::dto::websocket::MessageDto,
};
use uuid::Uuid;

use super::Identity;

/// Who authored a message, relative to the local user.
///
/// Computed once when the message is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    Own,
    Counterpart,
    System,
}

impl Author {
    /// Classify `sender` against the local identity.
    ///
    /// Callers filter with [`Identity::admits`] first, so anything that is
    /// neither the local user nor the system sentinel is the counterpart.
    pub fn classify(sender: &UserId, identity: &Identity) -> Self {
        if sender == &identity.local {
            Author::Own
        } else if sender.is_system() {
            Author::System
        } else {
            Author::Counterpart
        }
    }
}

/// Delivery indicator shown on own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMark {
    /// Single check.
    Delivered,
    /// Double check.
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub author: Author,
    pub content: String,
    pub timestamp: Timestamp,
    pub is_read: bool,
}

impl Message {
    /// Build a message from a relay payload.
    pub fn from_dto(dto: MessageDto, identity: &Identity) -> Result<Self, ValueObjectError> {
        let id = MessageId::new(dto.id)?;
        let sender_id = UserId::new(dto.sender_id)?;
        let author = Author::classify(&sender_id, identity);
        Ok(Self {
            id,
            sender_id,
            author,
            content: dto.content,
            timestamp: Timestamp::new(dto.timestamp),
            is_read: dto.is_read,
        })
    }

    /// A locally synthesized notice (presence changes, relay errors, connection trouble).
    pub fn notice(text: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: local_message_id(),
            sender_id: UserId::system(),
            author: Author::System,
            content: text.into(),
            timestamp: now,
            is_read: true,
        }
    }

    /// Delivery mark for own messages; `None` for everything else.
    pub fn delivery_mark(&self) -> Option<DeliveryMark> {
        match (self.author, self.is_read) {
            (Author::Own, true) => Some(DeliveryMark::Read),
            (Author::Own, false) => Some(DeliveryMark::Delivered),
            _ => None,
        }
    }
}

/// `local-<uuid>`; never collides with relay-assigned ids.
fn local_message_id() -> MessageId {
    let uuid = Uuid::new_v4();
    MessageId::new(format!("local-{uuid}")).unwrap_or_else(|_| MessageId::from_uuid(uuid))
}
