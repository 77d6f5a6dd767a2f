//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use mamalink_shared::time::millis_to_rfc3339;

use crate::{
    domain::{RepositoryError, RoomId},
    infrastructure::dto::http::{ParticipantDetailDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state
        .repository
        .list()
        .await
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.id.as_str().to_string(),
            participants: room
                .participants
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            message_count: room.messages.len(),
            created_at: millis_to_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(rooms)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;
    let room = match state.repository.get(&room_id).await {
        Ok(room) => room,
        Err(RepositoryError::RoomNotFound(_)) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load room '{}': {}", room_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut participants = Vec::with_capacity(room.participants.len());
    for p in &room.participants {
        let presence = state.presence(p).await;
        participants.push(ParticipantDetailDto {
            user_id: p.as_str().to_string(),
            online: presence.is_some(),
            role: presence.map(|info| info.role.to_string()),
            connected_at: presence.map(|info| millis_to_rfc3339(info.connected_at)),
        });
    }

    let room_detail = RoomDetailDto {
        id: room.id.as_str().to_string(),
        participants,
        message_count: room.messages.len(),
        unread_count: room.messages.iter().filter(|m| !m.is_read).count(),
        created_at: millis_to_rfc3339(room.created_at.value()),
    };

    Ok(Json(room_detail))
}
