//! UseCase: 既読処理

use std::sync::Arc;

use crate::{
    domain::{ConversationRepository, MessageId, RoomId, UserId},
    infrastructure::dto::websocket::{MessagesReadPayload, ServerEvent},
};

use super::{Outgoing, UseCaseError};

/// 既読処理のユースケース
pub struct MarkAsReadUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConversationRepository>,
}

impl MarkAsReadUseCase {
    /// 新しい MarkAsReadUseCase を作成
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// 既読処理を実行
    ///
    /// 呼び出し元宛てのメッセージのみ既読にし、一致した ID を両方の参加者へ
    /// `messagesRead` として配送する。一致が無ければ配送しない。
    pub async fn execute(
        &self,
        reader: UserId,
        room_id: RoomId,
        ids: Vec<MessageId>,
    ) -> Result<Vec<Outgoing>, UseCaseError> {
        let conversation = self.repository.get(&room_id).await?;
        let Some(counterpart) = conversation.counterpart_of(&reader).cloned() else {
            return Err(UseCaseError::NotParticipant {
                user: reader.into_string(),
                room: room_id.into_string(),
            });
        };

        let matched = self.repository.mark_read(&room_id, &reader, &ids).await?;
        if matched.is_empty() {
            return Ok(Vec::new());
        }

        let event = ServerEvent::MessagesRead(MessagesReadPayload {
            message_ids: matched.into_iter().map(MessageId::into_string).collect(),
        });
        Ok(vec![
            Outgoing::in_room(counterpart, room_id.clone(), event.clone()),
            Outgoing::in_room(reader, room_id, event),
        ])
    }
}
