//! Test fixtures: an in-process relay and chat clients driven through channels.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use mamalink_client::{
    ChatSession, ClientConfig, ClientError, RoomLifecycle, SessionConfig,
    domain::{Identity, Message, UnavailableReason},
    run_session,
    session::PendingMessage,
    view::ChatObserver,
};
use mamalink_server::domain::{Role, UserId};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
    task::JoinHandle,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Relay running on an ephemeral port for the lifetime of the test.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = mamalink_server::serve(listener).await {
                eprintln!("test server error: {e}");
            }
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What the observer saw at the last render.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub state: &'static str,
    pub messages: Vec<Message>,
    pub pending: Vec<PendingMessage>,
    pub unavailable: Option<UnavailableReason>,
}

impl Snapshot {
    pub fn contents(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.content.as_str()).collect()
    }
}

/// Publishes every render on a watch channel.
pub struct RecordingObserver {
    tx: watch::Sender<Snapshot>,
}

impl RecordingObserver {
    pub fn new() -> (Self, watch::Receiver<Snapshot>) {
        let (tx, rx) = watch::channel(Snapshot::default());
        (Self { tx }, rx)
    }
}

impl ChatObserver for RecordingObserver {
    fn render(&mut self, session: &ChatSession) {
        self.tx.send_modify(|snapshot| {
            snapshot.state = session.state().label();
            snapshot.messages = session.messages().to_vec();
            snapshot.pending = session.pending().to_vec();
        });
    }

    fn unavailable(&mut self, reason: &UnavailableReason) {
        let reason = reason.clone();
        self.tx
            .send_modify(|snapshot| snapshot.unavailable = Some(reason));
    }
}

pub fn session_config(local: &str, role: Role, counterpart: &str) -> SessionConfig {
    SessionConfig::new(Identity::new(
        UserId::new(local.to_string()).unwrap(),
        role,
        UserId::new(counterpart.to_string()).unwrap(),
    ))
}

/// A chat client running on its own task.
pub struct TestClient {
    input: mpsc::Sender<String>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<Result<ChatSession, ClientError>>,
}

impl TestClient {
    pub fn spawn(server: &TestServer, local: &str, role: Role, counterpart: &str) -> Self {
        Self::spawn_with(
            ClientConfig::new(server.ws_url(), session_config(local, role, counterpart)),
        )
    }

    pub fn spawn_with(config: ClientConfig) -> Self {
        let (input, input_rx) = mpsc::channel(16);
        let (mut observer, snapshots) = RecordingObserver::new();
        let task = tokio::spawn(async move { run_session(config, input_rx, &mut observer).await });
        Self {
            input,
            snapshots,
            task,
        }
    }

    pub fn spawn_ephemeral(server: &TestServer, local: &str, role: Role, counterpart: &str) -> Self {
        let mut session = session_config(local, role, counterpart);
        session.lifecycle = RoomLifecycle::Ephemeral;
        Self::spawn_with(ClientConfig::new(server.ws_url(), session))
    }

    pub async fn type_line(&self, line: &str) {
        self.input
            .send(line.to_string())
            .await
            .expect("client task stopped");
    }

    /// Wait until a render satisfies `predicate`.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&Snapshot) -> bool) -> Snapshot {
        tokio::time::timeout(WAIT_TIMEOUT, self.snapshots.wait_for(predicate))
            .await
            .expect("timed out waiting for the client")
            .expect("client observer dropped")
            .clone()
    }

    pub async fn wait_in_room(&mut self) -> Snapshot {
        self.wait_for(|s| s.state == "in room").await
    }

    /// Type `/quit` and wait for the session to end.
    pub async fn quit(self) -> Result<ChatSession, ClientError> {
        self.type_line("/quit").await;
        tokio::time::timeout(WAIT_TIMEOUT, self.task)
            .await
            .expect("timed out waiting for the client to quit")
            .expect("client task panicked")
    }
}
