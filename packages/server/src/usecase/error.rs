//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// Errors returned by the relay use cases.
///
/// Each one is reported back to the calling client as an `error` event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    /// Payload field failed validation
    #[error("invalid request: {0}")]
    InvalidInput(#[from] ValueObjectError),

    /// Caller is not one of the room's participants
    #[error("'{user}' is not a participant of room '{room}'")]
    NotParticipant { user: String, room: String },

    /// The declared receiver is not the caller's counterpart in the room
    #[error("'{receiver}' is not the counterpart in room '{room}'")]
    ReceiverMismatch { receiver: String, room: String },

    /// Storage failure or domain rule violation
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
