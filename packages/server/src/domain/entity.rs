//! Core domain models for the relay.

use serde::{Deserialize, Serialize};

use super::{
    error::ConversationError,
    value_object::{ClientNonce, MessageContent, MessageId, RoomId, Timestamp, UserId},
};

/// Default maximum number of messages kept per conversation
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1_000;

/// A two-party conversation (room) with its message history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Room identifier
    pub id: RoomId,
    /// The two participants, stored in sorted order
    pub participants: [UserId; 2],
    /// Message history in storage order
    pub messages: Vec<StoredMessage>,
    /// Timestamp when the conversation was created
    pub created_at: Timestamp,
    /// Maximum number of messages allowed (default: 1000)
    pub message_capacity: usize,
}

impl Conversation {
    /// Create a new empty conversation between two distinct users
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::SameParticipant` if `a == b`
    pub fn new(id: RoomId, a: UserId, b: UserId, created_at: Timestamp) -> Result<Self, ConversationError> {
        Self::with_capacity(id, a, b, created_at, DEFAULT_MESSAGE_CAPACITY)
    }

    /// Create a new empty conversation with a custom message capacity
    pub fn with_capacity(
        id: RoomId,
        a: UserId,
        b: UserId,
        created_at: Timestamp,
        message_capacity: usize,
    ) -> Result<Self, ConversationError> {
        if a == b {
            return Err(ConversationError::SameParticipant(a.into_string()));
        }
        let participants = if a < b { [a, b] } else { [b, a] };
        Ok(Self {
            id,
            participants,
            messages: Vec::new(),
            created_at,
            message_capacity,
        })
    }

    /// Whether `user` is one of the two participants
    pub fn involves(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// Whether this conversation is between exactly `a` and `b` (any order)
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        self.involves(a) && self.involves(b) && a != b
    }

    /// The other participant, if `user` takes part in this conversation
    pub fn counterpart_of(&self, user: &UserId) -> Option<&UserId> {
        match &self.participants {
            [first, second] if first == user => Some(second),
            [first, second] if second == user => Some(first),
            _ => None,
        }
    }

    /// Add a message to the history
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::MessageCapacityExceeded` if the history is full
    pub fn add_message(&mut self, message: StoredMessage) -> Result<(), ConversationError> {
        if self.messages.len() >= self.message_capacity {
            return Err(ConversationError::MessageCapacityExceeded {
                capacity: self.message_capacity,
                current: self.messages.len(),
            });
        }
        self.messages.push(message);
        Ok(())
    }

    /// Mark messages addressed to `reader` as read
    ///
    /// Returns the ids among `ids` that are addressed to `reader`, in the
    /// order given. Ids that are unknown or addressed to someone else are
    /// skipped; already-read messages are reported again.
    pub fn mark_read_by(&mut self, reader: &UserId, ids: &[MessageId]) -> Vec<MessageId> {
        let mut matched = Vec::new();
        for id in ids {
            if let Some(message) = self
                .messages
                .iter_mut()
                .find(|m| &m.id == id && &m.receiver == reader)
            {
                message.is_read = true;
                matched.push(id.clone());
            }
        }
        matched
    }
}

/// A message as stored by the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Server-assigned id
    pub id: MessageId,
    /// Author
    pub sender: UserId,
    /// Addressee
    pub receiver: UserId,
    /// Message content
    pub content: MessageContent,
    /// Server clock at storage time
    pub timestamp: Timestamp,
    /// Whether the receiver has acknowledged it
    pub is_read: bool,
    /// Nonce supplied by the sending client, echoed back on delivery
    pub client_nonce: Option<ClientNonce>,
}

impl StoredMessage {
    /// Create a new unread message
    pub fn new(
        id: MessageId,
        sender: UserId,
        receiver: UserId,
        content: MessageContent,
        timestamp: Timestamp,
        client_nonce: Option<ClientNonce>,
    ) -> Self {
        Self {
            id,
            sender,
            receiver,
            content,
            timestamp,
            is_read: false,
            client_nonce,
        }
    }
}
