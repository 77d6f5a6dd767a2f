//! Sans-IO chat session.
//!
//! [`ChatSession`] consumes [`SessionInput`] values and returns the
//! [`SessionAction`]s the runner has to perform. It never touches the
//! network, the terminal or the clock.

mod chat;
mod outbox;

pub use chat::ChatSession;
pub use outbox::{Outbox, PendingMessage, PendingStatus};

use std::time::Duration;

use mamalink_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::domain::UnavailableReason;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// The transport finished its handshake.
    Opened,
    /// A connection attempt failed.
    ConnectFailed { reason: String },
    /// An open connection went away.
    Closed { reason: String },
    /// The reconnect delay elapsed.
    RetryConnect,
    Received(ServerEvent),
    /// The user submitted a line.
    Compose(String),
    /// Periodic timer used to check deadlines.
    Tick,
}

/// Something the runner must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a new transport.
    Connect,
    /// Wait, then feed [`SessionInput::RetryConnect`].
    Reconnect { delay: Duration },
    Emit(ClientEvent),
    /// Clear the composer input field.
    ClearInput,
    /// The session gave up; close the transport and tell the user.
    Unavailable(UnavailableReason),
}
