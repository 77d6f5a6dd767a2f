//! InMemory Conversation Repository 実装
//!
//! ドメイン層が定義する ConversationRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`Conversation`）を直接ストレージとして使用しています。
//! 永続化ストアを実装する際は DB Row → DTO → ドメインモデルの変換層が必要になります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Conversation, ConversationRepository, MessageId, RepositoryError, RoomId, RoomIdFactory,
    StoredMessage, Timestamp, UserId,
};

/// インメモリ Conversation Repository 実装
#[derive(Default)]
pub struct InMemoryConversationRepository {
    /// RoomId -> Conversation
    conversations: Mutex<HashMap<RoomId, Conversation>>,
}

impl InMemoryConversationRepository {
    /// 新しい InMemoryConversationRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_or_create(
        &self,
        a: UserId,
        b: UserId,
        now: Timestamp,
    ) -> Result<Conversation, RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        if let Some(existing) = conversations.values().find(|c| c.is_between(&a, &b)) {
            return Ok(existing.clone());
        }

        let conversation = Conversation::new(RoomIdFactory::generate(), a, b, now)?;
        tracing::info!(
            "Created conversation '{}' between '{}' and '{}'",
            conversation.id,
            conversation.participants[0],
            conversation.participants[1]
        );
        conversations.insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, room_id: &RoomId) -> Result<Conversation, RepositoryError> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))
    }

    async fn list(&self) -> Vec<Conversation> {
        let conversations = self.conversations.lock().await;
        let mut all: Vec<Conversation> = conversations.values().cloned().collect();
        all.sort_by(|x, y| {
            x.created_at
                .cmp(&y.created_at)
                .then_with(|| x.id.as_str().cmp(y.id.as_str()))
        });
        all
    }

    async fn add_message(
        &self,
        room_id: &RoomId,
        message: StoredMessage,
    ) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))?;
        conversation.add_message(message)?;
        Ok(())
    }

    async fn mark_read(
        &self,
        room_id: &RoomId,
        reader: &UserId,
        ids: &[MessageId],
    ) -> Result<Vec<MessageId>, RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))?;
        Ok(conversation.mark_read_by(reader, ids))
    }
}
