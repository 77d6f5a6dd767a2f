//! Server state and connection management.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::{
    domain::{ConversationRepository, Role, RoomId, UserId},
    usecase::Outgoing,
};

/// Client connection information
pub struct ClientInfo {
    /// Identifies one WebSocket connection of this user
    pub connection_id: Uuid,
    /// Role declared at registration
    pub role: Role,
    /// Message sender channel
    pub sender: mpsc::UnboundedSender<String>,
    /// Unix timestamp when registered (milliseconds)
    pub connected_at: i64,
    /// Rooms this connection has started or resumed
    pub rooms: HashSet<RoomId>,
}

impl ClientInfo {
    pub fn new(
        connection_id: Uuid,
        role: Role,
        sender: mpsc::UnboundedSender<String>,
        connected_at: i64,
    ) -> Self {
        Self {
            connection_id,
            role,
            sender,
            connected_at,
            rooms: HashSet::new(),
        }
    }
}

/// Who is connected, as reported by the HTTP API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub role: Role,
    pub connected_at: i64,
}

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn ConversationRepository>,
    /// Registered users and their WebSocket sender channels
    pub connected_clients: Arc<Mutex<HashMap<UserId, ClientInfo>>>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self {
            repository,
            connected_clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register `user_id` on a new connection, replacing any previous one.
    ///
    /// Returns `true` when an older connection was replaced.
    pub async fn register(&self, user_id: UserId, info: ClientInfo) -> bool {
        let mut clients = self.connected_clients.lock().await;
        clients.insert(user_id, info).is_some()
    }

    /// Remove the registration if it still belongs to `connection_id`.
    ///
    /// Returns the rooms the connection had joined, or `None` when the user
    /// has since registered on another connection (or was never registered).
    pub async fn unregister(&self, user_id: &UserId, connection_id: Uuid) -> Option<HashSet<RoomId>> {
        let mut clients = self.connected_clients.lock().await;
        match clients.get(user_id) {
            Some(info) if info.connection_id == connection_id => {
                clients.remove(user_id).map(|info| info.rooms)
            }
            _ => None,
        }
    }

    /// Record that the connection `connection_id` of `user_id` joined `room_id`.
    pub async fn join_room(&self, user_id: &UserId, connection_id: Uuid, room_id: RoomId) {
        let mut clients = self.connected_clients.lock().await;
        if let Some(info) = clients.get_mut(user_id) {
            if info.connection_id == connection_id {
                info.rooms.insert(room_id);
            }
        }
    }

    pub async fn leave_room(&self, user_id: &UserId, connection_id: Uuid, room_id: &RoomId) {
        let mut clients = self.connected_clients.lock().await;
        if let Some(info) = clients.get_mut(user_id) {
            if info.connection_id == connection_id {
                info.rooms.remove(room_id);
            }
        }
    }

    pub async fn presence(&self, user_id: &UserId) -> Option<Presence> {
        self.connected_clients
            .lock()
            .await
            .get(user_id)
            .map(|info| Presence {
                role: info.role,
                connected_at: info.connected_at,
            })
    }

    /// Serialize and send each event to its addressee.
    ///
    /// Offline users are skipped, and so are room events for connections
    /// that have not joined the room.
    pub async fn deliver(&self, outgoing: Vec<Outgoing>) {
        let clients = self.connected_clients.lock().await;
        for Outgoing { to, room, event } in outgoing {
            let Some(client_info) = clients.get(&to) else {
                tracing::debug!("'{}' is offline, dropping {:?}", to, event);
                continue;
            };
            if let Some(room) = &room {
                if !client_info.rooms.contains(room) {
                    tracing::debug!("'{}' has not joined '{}', dropping {:?}", to, room, event);
                    continue;
                }
            }
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event for '{}': {}", to, e);
                    continue;
                }
            };
            if client_info.sender.send(json).is_err() {
                tracing::warn!("Failed to send event to client '{}'", to);
            }
        }
    }
}
