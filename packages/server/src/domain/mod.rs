//! Domain layer for the consultation chat.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{Conversation, StoredMessage};
pub use error::{ConversationError, RepositoryError, ValueObjectError};
pub use factory::{MessageIdFactory, RoomIdFactory};
pub use repository::ConversationRepository;
pub use value_object::{
    ClientNonce, MessageContent, MessageId, Role, RoomId, SYSTEM_SENDER, Timestamp, UserId,
};
