//! UseCase: 会話開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartConversationUseCase::execute() メソッド
//! - 2人の参加者のルームを取得または作成し、通知先を構築する
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回の会話開始、同じ組み合わせでの再開（同じルーム）
//! - 異常系：自分自身との会話、Repository の失敗

use std::sync::Arc;

use mamalink_shared::time::now_millis;

use crate::{
    domain::{ConversationRepository, RoomId, Timestamp, UserId},
    infrastructure::dto::websocket::{NoticePayload, RoomPayload, ServerEvent},
};

use super::{Outgoing, UseCaseError};

/// 会話開始のユースケース
pub struct StartConversationUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ConversationRepository>,
}

impl StartConversationUseCase {
    /// 新しい StartConversationUseCase を作成
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// 会話開始を実行
    ///
    /// # Returns
    ///
    /// * `Ok((RoomId, Vec<Outgoing>))` - ルーム ID と配送先（呼び出し元へ `conversationStarted`、ルームに参加済みの相手へ `user-joined`）
    /// * `Err(UseCaseError)` - 開始失敗
    pub async fn execute(
        &self,
        caller: UserId,
        target: UserId,
    ) -> Result<(RoomId, Vec<Outgoing>), UseCaseError> {
        let conversation = self
            .repository
            .find_or_create(caller.clone(), target.clone(), Timestamp::new(now_millis()))
            .await?;

        let room_id = conversation.id.clone();
        let outgoing = vec![
            Outgoing::new(
                caller.clone(),
                ServerEvent::ConversationStarted(RoomPayload {
                    room_id: room_id.as_str().to_string(),
                }),
            ),
            Outgoing::in_room(
                target,
                room_id.clone(),
                ServerEvent::UserJoined(NoticePayload {
                    message: format!("{caller} joined the conversation"),
                }),
            ),
        ];

        Ok((room_id, outgoing))
    }
}
