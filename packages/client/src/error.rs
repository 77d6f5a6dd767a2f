//! Client error types.

use std::time::Duration;

use mamalink_server::domain::ValueObjectError;
use thiserror::Error;

use crate::domain::UnavailableReason;

/// Errors surfaced by the client to its caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValueObjectError),

    #[error("user '{0}' cannot chat with themselves")]
    SameParticipant(String),

    #[error("chat unavailable: {0}")]
    Unavailable(UnavailableReason),
}

/// Errors of the WebSocket transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport is closed")]
    Closed,
}
