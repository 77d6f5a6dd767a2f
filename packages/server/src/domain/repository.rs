//! Repository trait（データアクセス層の抽象化）
//!
//! ドメイン層が定義し、インフラ層が実装します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Conversation, StoredMessage},
    error::RepositoryError,
    value_object::{MessageId, RoomId, Timestamp, UserId},
};

/// Storage of two-party conversations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Return the conversation between `a` and `b`, creating it if needed.
    async fn find_or_create(
        &self,
        a: UserId,
        b: UserId,
        now: Timestamp,
    ) -> Result<Conversation, RepositoryError>;

    /// Fetch a conversation by room id.
    async fn get(&self, room_id: &RoomId) -> Result<Conversation, RepositoryError>;

    /// All conversations, oldest first.
    async fn list(&self) -> Vec<Conversation>;

    /// Append a message to a conversation.
    async fn add_message(
        &self,
        room_id: &RoomId,
        message: StoredMessage,
    ) -> Result<(), RepositoryError>;

    /// Mark messages addressed to `reader` as read; returns the matched ids.
    async fn mark_read(
        &self,
        room_id: &RoomId,
        reader: &UserId,
        ids: &[MessageId],
    ) -> Result<Vec<MessageId>, RepositoryError>;
}
