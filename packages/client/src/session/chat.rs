//! The chat session state machine.

use std::{collections::HashSet, time::Instant};

use mamalink_server::{
    domain::{ClientNonce, MessageContent, MessageId, RoomId, Timestamp},
    infrastructure::dto::websocket::{
        ClientEvent, MarkAsReadPayload, MessageDto, RegisterPayload, RoomPayload,
        SendMessagePayload, ServerEvent, StartConversationPayload,
    },
};
use mamalink_shared::time::now_millis;

use super::{Outbox, PendingMessage, SessionAction, SessionInput};
use crate::{
    config::{RoomLifecycle, SessionConfig},
    domain::{Author, ConnectionState, HistoryState, Identity, Message, UnavailableReason},
};

/// One chat screen: a connection to the relay, one room, its message list.
///
/// All inputs are handled sequentially, so the message list is only ever
/// mutated by one handler at a time.
#[derive(Debug)]
pub struct ChatSession {
    config: SessionConfig,
    state: ConnectionState,
    mounted: bool,
    messages: Vec<Message>,
    /// Live messages received while the history request was in flight.
    live_during_history: Vec<MessageId>,
    outbox: Outbox,
    /// Consecutive failed connection attempts.
    failures: u32,
    /// Bumped each time history replaces the message list.
    history_generation: u64,
}

impl ChatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            mounted: false,
            messages: Vec::new(),
            live_during_history: Vec::new(),
            outbox: Outbox::default(),
            failures: 0,
            history_generation: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Sent messages not yet echoed by the relay, oldest first.
    pub fn pending(&self) -> &[PendingMessage] {
        self.outbox.entries()
    }

    /// Changes whenever `messages()` was rebuilt from a history load rather
    /// than appended to.
    pub fn history_generation(&self) -> u64 {
        self.history_generation
    }

    pub fn identity(&self) -> &Identity {
        &self.config.identity
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Start the session. Only the first call has an effect.
    pub fn mount(&mut self) -> Vec<SessionAction> {
        if self.mounted || self.state.is_terminal() {
            return Vec::new();
        }
        self.mounted = true;
        tracing::info!(
            "Opening chat between '{}' and '{}'",
            self.config.identity.local,
            self.config.identity.counterpart
        );
        self.state = ConnectionState::Connecting { attempt: 1 };
        vec![SessionAction::Connect]
    }

    /// Tear the session down. Every later input is ignored.
    pub fn unmount(&mut self) -> Vec<SessionAction> {
        if self.state == ConnectionState::Closed {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.config.lifecycle == RoomLifecycle::Ephemeral {
            if let Some(room_id) = self.state.room_id() {
                tracing::info!("Leaving room '{}'", room_id);
                actions.push(SessionAction::Emit(ClientEvent::LeaveConversation(
                    RoomPayload {
                        room_id: room_id.as_str().to_string(),
                    },
                )));
            }
        }

        self.state = ConnectionState::Closed;
        actions
    }

    pub fn handle(&mut self, input: SessionInput, now: Instant) -> Vec<SessionAction> {
        if !self.mounted || self.state.is_terminal() {
            tracing::debug!("Ignoring input in state '{}': {:?}", self.state.label(), input);
            return Vec::new();
        }

        match input {
            SessionInput::Opened => self.on_opened(now),
            SessionInput::ConnectFailed { reason } => {
                if !matches!(self.state, ConnectionState::Connecting { .. }) {
                    return Vec::new();
                }
                self.on_connection_lost("Could not reach the relay", &reason)
            }
            SessionInput::Closed { reason } => {
                if matches!(
                    self.state,
                    ConnectionState::Disconnected | ConnectionState::Connecting { .. }
                ) {
                    return Vec::new();
                }
                self.on_connection_lost("Connection lost", &reason)
            }
            SessionInput::RetryConnect => self.on_retry_connect(),
            SessionInput::Received(event) => self.on_server_event(event, now),
            SessionInput::Compose(text) => self.on_compose(text, now),
            SessionInput::Tick => self.on_tick(now),
        }
    }

    fn on_opened(&mut self, now: Instant) -> Vec<SessionAction> {
        if !matches!(self.state, ConnectionState::Connecting { .. }) {
            tracing::warn!("Transport opened in state '{}'", self.state.label());
            return Vec::new();
        }
        self.failures = 0;
        self.state = ConnectionState::Connected;

        let identity = &self.config.identity;
        tracing::info!("Connected, registering as '{}' ({})", identity.local, identity.role);
        let register = ClientEvent::Register(RegisterPayload {
            user_id: identity.local.as_str().to_string(),
            role: identity.role.as_str().to_string(),
        });

        self.state = ConnectionState::RoomPending {
            deadline: now + self.config.request_timeout,
            retries: 0,
        };
        vec![
            SessionAction::Emit(register),
            SessionAction::Emit(self.start_conversation()),
        ]
    }

    fn on_connection_lost(&mut self, what: &str, reason: &str) -> Vec<SessionAction> {
        self.live_during_history.clear();
        self.failures += 1;

        match self.config.reconnect.delay_for(self.failures) {
            Some(delay) => {
                tracing::warn!("{} ({}), retrying in {:?}", what, reason, delay);
                self.state = ConnectionState::Disconnected;
                self.push_notice(format!(
                    "{what}, retrying in {:.1}s",
                    delay.as_secs_f64()
                ));
                vec![SessionAction::Reconnect { delay }]
            }
            None => self.give_up(UnavailableReason::RelayUnreachable {
                attempts: self.failures,
            }),
        }
    }

    fn on_retry_connect(&mut self) -> Vec<SessionAction> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }
        let attempt = self.failures + 1;
        tracing::info!("Reconnecting (attempt {})", attempt);
        self.state = ConnectionState::Connecting { attempt };
        vec![SessionAction::Connect]
    }

    fn on_server_event(&mut self, event: ServerEvent, now: Instant) -> Vec<SessionAction> {
        match event {
            ServerEvent::ConversationStarted(payload) => {
                self.on_conversation_started(payload.room_id, now)
            }
            ServerEvent::MessageHistory(payload) => {
                self.on_history(payload.messages);
                Vec::new()
            }
            ServerEvent::NewMessage(dto) => self.on_new_message(dto),
            ServerEvent::MessagesRead(payload) => {
                self.on_messages_read(&payload.message_ids);
                Vec::new()
            }
            ServerEvent::UserJoined(payload) | ServerEvent::UserLeft(payload) => {
                self.push_notice(payload.message);
                Vec::new()
            }
            ServerEvent::Error(payload) => {
                tracing::warn!("Relay reported an error: {}", payload.message);
                self.push_notice(payload.message);
                Vec::new()
            }
        }
    }

    fn on_conversation_started(&mut self, room_id: String, now: Instant) -> Vec<SessionAction> {
        if !matches!(self.state, ConnectionState::RoomPending { .. }) {
            tracing::debug!("Ignoring conversationStarted in state '{}'", self.state.label());
            return Vec::new();
        }
        let room_id = match RoomId::new(room_id) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::warn!("Relay assigned an invalid room: {}", e);
                return Vec::new();
            }
        };

        tracing::info!("Joined room '{}', requesting history", room_id);
        let request = history_request(&room_id);
        self.live_during_history.clear();
        self.state = ConnectionState::RoomActive {
            room_id,
            history: HistoryState::Requested {
                deadline: now + self.config.request_timeout,
                retries: 0,
            },
        };
        vec![SessionAction::Emit(request)]
    }

    fn on_history(&mut self, dtos: Vec<MessageDto>) {
        if !matches!(
            self.state,
            ConnectionState::RoomActive {
                history: HistoryState::Requested { .. },
                ..
            }
        ) {
            tracing::debug!("Ignoring messageHistory in state '{}'", self.state.label());
            return;
        }

        let mut loaded = Vec::with_capacity(dtos.len());
        for dto in dtos {
            if let Some(message) = self.ingest(dto) {
                loaded.push(message);
            }
        }
        // stable: equal timestamps keep relay order
        loaded.sort_by_key(|m| m.timestamp);
        tracing::info!("Loaded {} messages of history", loaded.len());

        for id in std::mem::take(&mut self.live_during_history) {
            if loaded.iter().any(|m| m.id == id) {
                continue;
            }
            if let Some(live) = self.messages.iter().find(|m| m.id == id) {
                loaded.push(live.clone());
            }
        }

        self.messages = loaded;
        self.history_generation += 1;
        if let ConnectionState::RoomActive { history, .. } = &mut self.state {
            *history = HistoryState::Loaded;
        }
    }

    fn on_new_message(&mut self, dto: MessageDto) -> Vec<SessionAction> {
        let Some(room_id) = self.state.room_id().cloned() else {
            tracing::debug!("Ignoring newMessage outside an active room");
            return Vec::new();
        };
        let Some(message) = self.ingest(dto) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if message.sender_id == self.config.identity.counterpart {
            actions.push(SessionAction::Emit(ClientEvent::MarkAsRead(
                MarkAsReadPayload {
                    room_id: room_id.into_string(),
                    message_ids: vec![message.id.as_str().to_string()],
                },
            )));
        }

        if self.messages.iter().any(|m| m.id == message.id) {
            tracing::debug!("Duplicate message '{}' ignored", message.id);
            return actions;
        }
        if matches!(
            self.state,
            ConnectionState::RoomActive {
                history: HistoryState::Requested { .. },
                ..
            }
        ) {
            self.live_during_history.push(message.id.clone());
        }
        self.messages.push(message);
        actions
    }

    fn on_messages_read(&mut self, ids: &[String]) {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for message in &mut self.messages {
            if ids.contains(message.id.as_str()) {
                message.is_read = true;
            }
        }
    }

    fn on_compose(&mut self, text: String, now: Instant) -> Vec<SessionAction> {
        let Some(room_id) = self.state.room_id() else {
            tracing::debug!("Not in a room yet, input ignored");
            return Vec::new();
        };
        let Ok(content) = MessageContent::new(text) else {
            return Vec::new();
        };

        let nonce = ClientNonce::generate();
        let event = ClientEvent::SendMessage(SendMessagePayload {
            room_id: room_id.as_str().to_string(),
            content: content.as_str().to_string(),
            receiver_id: self.config.identity.counterpart.as_str().to_string(),
            client_nonce: Some(nonce.as_str().to_string()),
        });
        self.outbox.push(nonce, content.into_string(), now);

        vec![SessionAction::Emit(event), SessionAction::ClearInput]
    }

    fn on_tick(&mut self, now: Instant) -> Vec<SessionAction> {
        for failed in self.outbox.expire(now, self.config.ack_timeout) {
            tracing::warn!(
                "No echo for message {} within {:?}",
                failed.nonce,
                self.config.ack_timeout
            );
        }

        let max_retries = self.config.max_request_retries;
        let next_deadline = now + self.config.request_timeout;
        match self.state.clone() {
            ConnectionState::RoomPending { deadline, retries } if now >= deadline => {
                if retries >= max_retries {
                    return self.give_up(UnavailableReason::NegotiationTimedOut);
                }
                tracing::warn!("No room assigned yet, retrying ({}/{})", retries + 1, max_retries);
                self.state = ConnectionState::RoomPending {
                    deadline: next_deadline,
                    retries: retries + 1,
                };
                vec![SessionAction::Emit(self.start_conversation())]
            }
            ConnectionState::RoomActive {
                room_id,
                history: HistoryState::Requested { deadline, retries },
            } if now >= deadline => {
                if retries >= max_retries {
                    return self.give_up(UnavailableReason::HistoryTimedOut);
                }
                tracing::warn!("No history yet, retrying ({}/{})", retries + 1, max_retries);
                let request = history_request(&room_id);
                self.state = ConnectionState::RoomActive {
                    room_id,
                    history: HistoryState::Requested {
                        deadline: next_deadline,
                        retries: retries + 1,
                    },
                };
                vec![SessionAction::Emit(request)]
            }
            _ => Vec::new(),
        }
    }

    fn give_up(&mut self, reason: UnavailableReason) -> Vec<SessionAction> {
        tracing::error!("Chat unavailable: {}", reason);
        self.state = ConnectionState::Unavailable(reason.clone());
        vec![SessionAction::Unavailable(reason)]
    }

    /// Classify a relay payload and settle the pending entry of an own echo.
    fn ingest(&mut self, dto: MessageDto) -> Option<Message> {
        let nonce = dto.client_nonce.clone().map(ClientNonce::from_wire);
        let receiver = dto.receiver_id.clone();
        let message = match Message::from_dto(dto, &self.config.identity) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping invalid message from relay: {}", e);
                return None;
            }
        };
        if !self
            .config
            .identity
            .admits(&message.sender_id, receiver.as_deref())
        {
            tracing::warn!(
                "Dropping message '{}' from '{}' outside this conversation",
                message.id,
                message.sender_id
            );
            return None;
        }
        if message.author == Author::Own {
            self.outbox.reconcile(nonce.as_ref(), &message.content);
        }
        Some(message)
    }

    fn push_notice(&mut self, text: String) {
        self.messages
            .push(Message::notice(text, Timestamp::new(now_millis())));
    }

    fn start_conversation(&self) -> ClientEvent {
        ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: self.config.identity.counterpart.as_str().to_string(),
        })
    }
}

fn history_request(room_id: &RoomId) -> ClientEvent {
    ClientEvent::GetMessageHistory(RoomPayload {
        room_id: room_id.as_str().to_string(),
    })
}
