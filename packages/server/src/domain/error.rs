//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// UserId too long error
    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// MessageId validation error
    #[error("MessageId cannot be empty")]
    MessageIdEmpty,

    /// MessageContent validation error (empty or whitespace only)
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// Unknown role name
    #[error("Unknown role '{0}' (expected 'doctor' or 'patient')")]
    UnknownRole(String),

    /// The id is reserved for relay notices
    #[error("UserId '{0}' is reserved")]
    ReservedUserId(String),
}

/// Errors related to Conversation domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Both participants are the same user
    #[error("A conversation needs two distinct participants (got '{0}' twice)")]
    SameParticipant(String),

    /// Message capacity exceeded error
    #[error("Message capacity exceeded: maximum {capacity} messages allowed (current: {current})")]
    MessageCapacityExceeded { capacity: usize, current: usize },
}

/// Errors returned by repository implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No conversation with the given room id
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Domain rule violated while mutating a conversation
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}
