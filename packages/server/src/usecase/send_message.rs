//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージの保存と、送信者・受信者への `newMessage` 配送
//!
//! ### なぜこのテストが必要か
//! - クライアントは送信したメッセージをエコーでのみ表示するため、送信者にも配送されることを保証
//! - クライアントの nonce がエコーに含まれることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信
//! - 異常系：参加者以外の送信、受信者の不一致、メッセージ容量超過

use std::sync::Arc;

use mamalink_shared::time::now_millis;

use crate::{
    domain::{
        ClientNonce, ConversationRepository, MessageContent, MessageIdFactory, RoomId,
        StoredMessage, Timestamp, UserId,
    },
    infrastructure::dto::websocket::{MessageDto, ServerEvent},
};

use super::{Outgoing, UseCaseError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConversationRepository>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Outgoing>)` - 送信者と受信者への `newMessage`
    /// * `Err(UseCaseError)` - 送信失敗
    pub async fn execute(
        &self,
        sender: UserId,
        room_id: RoomId,
        receiver: UserId,
        content: MessageContent,
        client_nonce: Option<ClientNonce>,
    ) -> Result<Vec<Outgoing>, UseCaseError> {
        // 1. 参加者・受信者の検証
        let conversation = self.repository.get(&room_id).await?;
        let Some(counterpart) = conversation.counterpart_of(&sender) else {
            return Err(UseCaseError::NotParticipant {
                user: sender.into_string(),
                room: room_id.into_string(),
            });
        };
        if counterpart != &receiver {
            return Err(UseCaseError::ReceiverMismatch {
                receiver: receiver.into_string(),
                room: room_id.into_string(),
            });
        }

        // 2. Repository 経由でメッセージを保存
        let message = StoredMessage::new(
            MessageIdFactory::generate(),
            sender.clone(),
            receiver.clone(),
            content,
            Timestamp::new(now_millis()),
            client_nonce,
        );
        let dto = MessageDto::from(&message);
        self.repository.add_message(&room_id, message).await?;

        // 3. 送信者（エコー）と受信者へ配送
        Ok(vec![
            Outgoing::in_room(sender, room_id.clone(), ServerEvent::NewMessage(dto.clone())),
            Outgoing::in_room(receiver, room_id, ServerEvent::NewMessage(dto)),
        ])
    }
}
