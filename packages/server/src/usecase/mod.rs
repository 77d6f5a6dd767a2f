//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。
//! 各ユースケースは配送先（`Outgoing`）のリストを返し、実際の送信は UI 層が行います。

pub mod error;
pub mod fetch_history;
pub mod leave_conversation;
pub mod mark_as_read;
pub mod send_message;
pub mod start_conversation;

pub use error::UseCaseError;
pub use fetch_history::FetchHistoryUseCase;
pub use leave_conversation::LeaveConversationUseCase;
pub use mark_as_read::MarkAsReadUseCase;
pub use send_message::SendMessageUseCase;
pub use start_conversation::StartConversationUseCase;

use crate::{
    domain::{RoomId, UserId},
    infrastructure::dto::websocket::ServerEvent,
};

/// An event addressed to one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: UserId,
    /// Room the event belongs to; only connections that joined it receive it
    pub room: Option<RoomId>,
    pub event: ServerEvent,
}

impl Outgoing {
    /// A direct reply, delivered regardless of joined rooms.
    pub fn new(to: UserId, event: ServerEvent) -> Self {
        Self {
            to,
            room: None,
            event,
        }
    }

    /// A room event, delivered only if the addressee's connection joined `room`.
    pub fn in_room(to: UserId, room: RoomId, event: ServerEvent) -> Self {
        Self {
            to,
            room: Some(room),
            event,
        }
    }
}
