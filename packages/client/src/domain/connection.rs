//! Explicit connection state of a chat session.

use std::{fmt, time::Instant};

use mamalink_server::domain::RoomId;

/// Progress of the history fetch for the active room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    Requested { deadline: Instant, retries: u32 },
    Loaded,
}

/// Why the session gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    RelayUnreachable { attempts: u32 },
    NegotiationTimedOut,
    HistoryTimedOut,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::RelayUnreachable { attempts } => {
                write!(f, "relay unreachable after {attempts} attempts")
            }
            UnavailableReason::NegotiationTimedOut => write!(f, "no room assigned by the relay"),
            UnavailableReason::HistoryTimedOut => write!(f, "message history never arrived"),
        }
    }
}

/// Where the session is in its lifecycle.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> RoomPending -> RoomActive
///      ^                                                      |
///      +------------------------ connection lost -------------+
/// ```
///
/// `Unavailable` and `Closed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
    RoomPending { deadline: Instant, retries: u32 },
    RoomActive { room_id: RoomId, history: HistoryState },
    Unavailable(UnavailableReason),
    Closed,
}

impl ConnectionState {
    /// The active room, if any.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            ConnectionState::RoomActive { room_id, .. } => Some(room_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionState::Unavailable(_) | ConnectionState::Closed
        )
    }

    /// Short label for status lines and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::RoomPending { .. } => "joining room",
            ConnectionState::RoomActive {
                history: HistoryState::Requested { .. },
                ..
            } => "loading history",
            ConnectionState::RoomActive {
                history: HistoryState::Loaded,
                ..
            } => "in room",
            ConnectionState::Unavailable(_) => "unavailable",
            ConnectionState::Closed => "closed",
        }
    }
}
