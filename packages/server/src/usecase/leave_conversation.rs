//! UseCase: 会話離脱処理
//!
//! `leaveConversation` を受信したとき、および接続が切れたときに呼ばれる。

use std::sync::Arc;

use crate::{
    domain::{ConversationRepository, RoomId, UserId},
    infrastructure::dto::websocket::{NoticePayload, ServerEvent},
};

use super::{Outgoing, UseCaseError};

/// 会話離脱のユースケース
pub struct LeaveConversationUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConversationRepository>,
}

impl LeaveConversationUseCase {
    /// 新しい LeaveConversationUseCase を作成
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// 会話離脱を実行し、相手への `user-left` 通知を返す
    pub async fn execute(&self, user: UserId, room_id: RoomId) -> Result<Vec<Outgoing>, UseCaseError> {
        let conversation = self.repository.get(&room_id).await?;
        let counterpart = conversation
            .counterpart_of(&user)
            .cloned()
            .ok_or_else(|| UseCaseError::NotParticipant {
                user: user.as_str().to_string(),
                room: room_id.as_str().to_string(),
            })?;

        Ok(vec![Outgoing::in_room(
            counterpart,
            room_id,
            ServerEvent::UserLeft(NoticePayload {
                message: format!("{user} left the conversation"),
            }),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::Timestamp, infrastructure::repository::InMemoryConversationRepository};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_leave_notifies_counterpart() {
        // テスト項目: 離脱すると相手に user-left が配送される
        // given (前提条件):
        let repository = Arc::new(InMemoryConversationRepository::new());
        let conv = repository
            .find_or_create(user("doctor123"), user("patient456"), Timestamp::new(0))
            .await
            .unwrap();
        let usecase = LeaveConversationUseCase::new(repository);

        // when (操作):
        let outgoing = usecase
            .execute(user("doctor123"), conv.id.clone())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            outgoing,
            vec![Outgoing::in_room(
                user("patient456"),
                conv.id,
                ServerEvent::UserLeft(NoticePayload {
                    message: "doctor123 left the conversation".to_string()
                })
            )]
        );
    }
}
