//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use mamalink_shared::time::now_millis;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    domain::{ClientNonce, MessageContent, MessageId, Role, RoomId, UserId, ValueObjectError},
    infrastructure::dto::websocket::{ClientEvent, RegisterPayload, ServerEvent},
    ui::state::{AppState, ClientInfo},
    usecase::{
        FetchHistoryUseCase, LeaveConversationUseCase, MarkAsReadUseCase, Outgoing,
        SendMessageUseCase, StartConversationUseCase, UseCaseError,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// A registered connection.
struct Registration {
    user_id: UserId,
    connection_id: Uuid,
    rx: mpsc::UnboundedReceiver<String>,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(Registration {
        user_id,
        connection_id,
        mut rx,
    }) = await_registration(&mut sender, &mut receiver, &state).await
    else {
        tracing::info!("Connection closed before registration");
        return;
    };

    let user_id_clone = user_id.clone();
    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error for '{}': {}", user_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", user_id_clone, text);
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse event from '{}': {}", user_id_clone, e);
                            state_clone
                                .deliver(vec![Outgoing::new(
                                    user_id_clone.clone(),
                                    ServerEvent::error(format!("malformed event: {e}")),
                                )])
                                .await;
                            continue;
                        }
                    };

                    let outgoing =
                        match dispatch(&state_clone, &user_id_clone, connection_id, event).await {
                            Ok(outgoing) => outgoing,
                            Err(e) => {
                                tracing::warn!("Request from '{}' failed: {}", user_id_clone, e);
                                vec![Outgoing::new(
                                    user_id_clone.clone(),
                                    ServerEvent::error(e.to_string()),
                                )]
                            }
                        };
                    state_clone.deliver(outgoing).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", user_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward queued events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Counterparts of the rooms this connection joined hear `user-left`.
    let Some(rooms) = state.unregister(&user_id, connection_id).await else {
        tracing::info!(
            "Connection of '{}' closed after being replaced by a newer one",
            user_id
        );
        return;
    };
    tracing::info!("Client '{}' disconnected and removed from registry", user_id);

    let leave_usecase = LeaveConversationUseCase::new(state.repository.clone());
    for room_id in rooms {
        match leave_usecase.execute(user_id.clone(), room_id.clone()).await {
            Ok(outgoing) => state.deliver(outgoing).await,
            Err(e) => tracing::warn!("Failed to notify leave of '{}' in '{}': {}", user_id, room_id, e),
        }
    }
}

/// Read frames until a valid `register` event arrives.
///
/// Returns `None` if the socket closes first.
async fn await_registration(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
) -> Option<Registration> {
    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        };

        let reply = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(ClientEvent::Register(payload)) => match parse_registration(payload) {
                Ok((user_id, role)) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let connection_id = Uuid::new_v4();
                    let replaced = state
                        .register(
                            user_id.clone(),
                            ClientInfo::new(connection_id, role, tx, now_millis()),
                        )
                        .await;
                    if replaced {
                        tracing::info!("Client '{}' re-registered, previous connection replaced", user_id);
                    } else {
                        tracing::info!("Client '{}' registered as {}", user_id, role);
                    }
                    return Some(Registration {
                        user_id,
                        connection_id,
                        rx,
                    });
                }
                Err(e) => ServerEvent::error(format!("invalid registration: {e}")),
            },
            Ok(other) => ServerEvent::error(format!("register before '{}'", other.name())),
            Err(e) => ServerEvent::error(format!("malformed event: {e}")),
        };

        tracing::warn!("Rejected frame before registration: {:?}", reply);
        let Ok(json) = serde_json::to_string(&reply) else {
            continue;
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            return None;
        }
    }
    None
}

fn parse_registration(payload: RegisterPayload) -> Result<(UserId, Role), ValueObjectError> {
    let user_id = UserId::new(payload.user_id)?;
    if user_id.is_system() {
        return Err(ValueObjectError::ReservedUserId(user_id.into_string()));
    }
    let role = payload.role.parse::<Role>()?;
    Ok((user_id, role))
}

/// Convert a client event into domain values and run the matching use case.
async fn dispatch(
    state: &AppState,
    caller: &UserId,
    connection_id: Uuid,
    event: ClientEvent,
) -> Result<Vec<Outgoing>, UseCaseError> {
    let repository = state.repository.clone();
    match event {
        ClientEvent::Register(payload) => {
            tracing::warn!(
                "'{}' sent a second register (as '{}'), ignoring",
                caller,
                payload.user_id
            );
            Ok(Vec::new())
        }
        ClientEvent::StartConversation(payload) => {
            let target = UserId::new(payload.target_user_id)?;
            if target.is_system() {
                return Err(ValueObjectError::ReservedUserId(target.into_string()).into());
            }
            let (room_id, outgoing) = StartConversationUseCase::new(repository)
                .execute(caller.clone(), target)
                .await?;
            state.join_room(caller, connection_id, room_id).await;
            Ok(outgoing)
        }
        ClientEvent::GetMessageHistory(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            FetchHistoryUseCase::new(repository)
                .execute(caller.clone(), room_id)
                .await
        }
        ClientEvent::SendMessage(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let receiver = UserId::new(payload.receiver_id)?;
            let content = MessageContent::new(payload.content)?;
            let nonce = payload.client_nonce.map(ClientNonce::from_wire);
            SendMessageUseCase::new(repository)
                .execute(caller.clone(), room_id, receiver, content, nonce)
                .await
        }
        ClientEvent::MarkAsRead(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let ids = payload
                .message_ids
                .into_iter()
                .map(MessageId::new)
                .collect::<Result<Vec<_>, _>>()?;
            MarkAsReadUseCase::new(repository)
                .execute(caller.clone(), room_id, ids)
                .await
        }
        ClientEvent::LeaveConversation(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let outgoing = LeaveConversationUseCase::new(repository)
                .execute(caller.clone(), room_id.clone())
                .await?;
            state.leave_room(caller, connection_id, &room_id).await;
            Ok(outgoing)
        }
    }
}
