//! UseCase: メッセージ履歴取得処理

use std::sync::Arc;

use crate::{
    domain::{ConversationRepository, RoomId, UserId},
    infrastructure::dto::websocket::{MessageDto, MessageHistoryPayload, ServerEvent},
};

use super::{Outgoing, UseCaseError};

/// メッセージ履歴取得のユースケース
pub struct FetchHistoryUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConversationRepository>,
}

impl FetchHistoryUseCase {
    /// 新しい FetchHistoryUseCase を作成
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// 履歴取得を実行
    ///
    /// 呼び出し元が参加者である場合のみ、保存順の履歴を `messageHistory` として返す。
    pub async fn execute(&self, caller: UserId, room_id: RoomId) -> Result<Vec<Outgoing>, UseCaseError> {
        let conversation = self.repository.get(&room_id).await?;
        if !conversation.involves(&caller) {
            return Err(UseCaseError::NotParticipant {
                user: caller.into_string(),
                room: room_id.into_string(),
            });
        }

        let messages = conversation.messages.iter().map(MessageDto::from).collect();
        Ok(vec![Outgoing::new(
            caller,
            ServerEvent::MessageHistory(MessageHistoryPayload { messages }),
        )])
    }
}
