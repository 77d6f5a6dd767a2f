//! Event loop driving a [`ChatSession`] over a real transport.

use std::{collections::VecDeque, time::Duration};

use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    config::ClientConfig,
    error::{ClientError, TransportError},
    session::{ChatSession, SessionAction, SessionInput},
    transport::{Transport, TransportEvent},
    view::ChatObserver,
};

/// Typing this line ends the session.
pub const QUIT_COMMAND: &str = "/quit";

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// What woke the loop up.
enum Wake {
    Transport(TransportEvent),
    Line(Option<String>),
    ReconnectDue,
    Tick,
    Shutdown,
}

/// Run one chat session until the input ends, `/quit` is typed or Ctrl-C.
///
/// Returns the torn-down session, or `ClientError::Unavailable` when the
/// session gave up on the relay.
pub async fn run_session<O: ChatObserver>(
    config: ClientConfig,
    mut input: mpsc::Receiver<String>,
    observer: &mut O,
) -> Result<ChatSession, ClientError> {
    let mut session = ChatSession::new(config.session.clone());
    let mut transport: Option<Transport> = None;
    let mut reconnect_at: Option<Instant> = None;

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut actions: VecDeque<SessionAction> = session.mount().into();

    loop {
        while let Some(action) = actions.pop_front() {
            match action {
                SessionAction::Connect => {
                    let opened = Transport::open(&config.server_url, config.connect_timeout).await;
                    let now = std::time::Instant::now();
                    let follow_up = match opened {
                        Ok(opened) => {
                            transport = Some(opened);
                            session.handle(SessionInput::Opened, now)
                        }
                        Err(e) => {
                            tracing::warn!("Failed to connect to {}: {}", config.server_url, e);
                            session.handle(
                                SessionInput::ConnectFailed {
                                    reason: e.to_string(),
                                },
                                now,
                            )
                        }
                    };
                    actions.extend(follow_up);
                }
                SessionAction::Reconnect { delay } => {
                    reconnect_at = Some(Instant::now() + delay);
                }
                SessionAction::Emit(event) => {
                    let sent = match &transport {
                        Some(transport) => transport.send(&event),
                        None => Err(TransportError::Closed),
                    };
                    if let Err(e) = sent {
                        tracing::warn!("Dropped '{}': {}", event.name(), e);
                    }
                }
                SessionAction::ClearInput => observer.input_cleared(),
                SessionAction::Unavailable(reason) => {
                    observer.render(&session);
                    observer.unavailable(&reason);
                    if let Some(transport) = transport.take() {
                        transport.close().await;
                    }
                    return Err(ClientError::Unavailable(reason));
                }
            }
        }
        observer.render(&session);

        let wake = tokio::select! {
            event = next_transport_event(&mut transport) => Wake::Transport(event),
            line = input.recv() => Wake::Line(line),
            _ = sleep_until(reconnect_at) => Wake::ReconnectDue,
            _ = ticker.tick() => Wake::Tick,
            _ = &mut shutdown => Wake::Shutdown,
        };

        let now = std::time::Instant::now();
        let next = match wake {
            Wake::Transport(TransportEvent::Event(event)) => SessionInput::Received(event),
            Wake::Transport(TransportEvent::Closed { reason }) => {
                tracing::warn!("Relay connection closed: {}", reason);
                transport = None;
                SessionInput::Closed { reason }
            }
            Wake::Line(Some(line)) if line.trim() == QUIT_COMMAND => break,
            Wake::Line(Some(line)) => SessionInput::Compose(line),
            Wake::Line(None) | Wake::Shutdown => break,
            Wake::ReconnectDue => {
                reconnect_at = None;
                SessionInput::RetryConnect
            }
            Wake::Tick => SessionInput::Tick,
        };
        actions.extend(session.handle(next, now));
    }

    for action in session.unmount() {
        if let (SessionAction::Emit(event), Some(transport)) = (action, &transport) {
            if let Err(e) = transport.send(&event) {
                tracing::warn!("Dropped '{}' on teardown: {}", event.name(), e);
            }
        }
    }
    if let Some(transport) = transport.take() {
        transport.close().await;
    }
    observer.render(&session);
    tracing::info!("Chat session closed");

    Ok(session)
}

async fn next_transport_event(transport: &mut Option<Transport>) -> TransportEvent {
    match transport {
        Some(transport) => transport
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed {
                reason: "transport stopped".to_string(),
            }),
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
