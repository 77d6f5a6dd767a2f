//! Client configuration.
//!
//! Command-line arguments are parsed with `clap` and turned into plain
//! configuration structs that tests can build directly.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use mamalink_server::domain::{Role, UserId, ValueObjectError};

use crate::{
    domain::{Identity, ReconnectPolicy},
    error::ClientError,
};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080/ws";
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REQUEST_RETRIES: u32 = 3;

/// What happens to the room membership when the chat screen closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RoomLifecycle {
    /// Stay in the room; nothing is sent on close.
    #[default]
    Persistent,
    /// Send `leaveConversation` on close.
    Ephemeral,
}

/// Parameters of the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub identity: Identity,
    pub lifecycle: RoomLifecycle,
    pub reconnect: ReconnectPolicy,
    /// How long a sent message may stay unechoed before it is flagged failed.
    pub ack_timeout: Duration,
    /// Deadline for `conversationStarted` and `messageHistory` replies.
    pub request_timeout: Duration,
    pub max_request_retries: u32,
}

impl SessionConfig {
    /// Session configuration with default timeouts and policies.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            lifecycle: RoomLifecycle::default(),
            reconnect: ReconnectPolicy::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_request_retries: DEFAULT_MAX_REQUEST_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub connect_timeout: Duration,
    pub session: SessionConfig,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, session: SessionConfig) -> Self {
        Self {
            server_url: server_url.into(),
            connect_timeout: session.request_timeout,
            session,
        }
    }
}

/// Mamalink consultation chat client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Relay WebSocket URL
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub url: String,

    /// Local user id
    #[arg(short, long)]
    pub user_id: UserId,

    /// Local role (doctor or patient)
    #[arg(short, long)]
    pub role: Role,

    /// User id of the person to chat with
    #[arg(short, long)]
    pub counterpart: UserId,

    /// Whether to leave the room when the client exits
    #[arg(long, value_enum, default_value_t = RoomLifecycle::Persistent)]
    pub lifecycle: RoomLifecycle,

    /// Milliseconds before an unechoed message is flagged as failed
    #[arg(long, default_value_t = 5_000)]
    pub ack_timeout_ms: u64,

    /// Milliseconds to wait for room and history replies
    #[arg(long, default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Consecutive failed connection attempts before giving up
    #[arg(long, default_value_t = 5)]
    pub max_reconnect_attempts: u32,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl CliArgs {
    pub fn into_config(self) -> Result<ClientConfig, ClientError> {
        if self.user_id == self.counterpart {
            return Err(ClientError::SameParticipant(self.user_id.into_string()));
        }
        // the system id only authors relay notices
        for id in [&self.user_id, &self.counterpart] {
            if id.is_system() {
                return Err(ValueObjectError::ReservedUserId(id.as_str().to_string()).into());
            }
        }

        let mut session = SessionConfig::new(Identity::new(self.user_id, self.role, self.counterpart));
        session.lifecycle = self.lifecycle;
        session.ack_timeout = Duration::from_millis(self.ack_timeout_ms);
        session.request_timeout = Duration::from_millis(self.request_timeout_ms);
        session.reconnect.max_attempts = self.max_reconnect_attempts;

        Ok(ClientConfig::new(self.url, session))
    }
}
