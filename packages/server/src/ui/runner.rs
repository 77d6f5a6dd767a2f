//! Router construction and server entry points.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::infrastructure::repository::InMemoryConversationRepository;

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router over `state`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until a shutdown signal arrives.
pub async fn run(host: &str, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    serve(listener).await
}

/// Serve on an already bound listener with a fresh in-memory store.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(Arc::new(
        InMemoryConversationRepository::new(),
    )));
    tracing::info!("Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}
