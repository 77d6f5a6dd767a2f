//! WebSocket transport to the relay.
//!
//! A thin I/O layer: frames are decoded into [`ServerEvent`]s and encoded
//! from [`ClientEvent`]s. Protocol logic stays in the session.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mamalink_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::TransportError;

/// How long `close` waits for the close frame to be written.
const CLOSE_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Event(ServerEvent),
    Closed { reason: String },
}

/// One open connection to the relay.
///
/// Dropping the handle aborts the reader and writer tasks, which releases
/// the socket.
pub struct Transport {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Transport {
    pub async fn open(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let (stream, _response) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;
        tracing::info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    tracing::warn!("Failed to write frame: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let reason = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received: {}", text.as_str());
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                if inbound_tx.send(TransportEvent::Event(event)).is_err() {
                                    return;
                                }
                            }
                            Err(e) => tracing::warn!("Ignoring undecodable frame: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|f| f.reason.as_str().to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "closed by relay".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.to_string(),
                    None => break "connection ended".to_string(),
                }
            };
            let _ = inbound_tx.send(TransportEvent::Closed { reason });
        });

        Ok(Self {
            outbound,
            inbound,
            reader,
            writer,
        })
    }

    /// Queue an event for the relay.
    pub fn send(&self, event: &ClientEvent) -> Result<(), TransportError> {
        let json = serde_json::to_string(event)?;
        tracing::debug!("Sending: {}", json);
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| TransportError::Closed)
    }

    /// Next event from the relay. `None` once the reader is gone.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    /// Send a close frame, give the writer a moment to flush it, then stop both tasks.
    pub async fn close(mut self) {
        if self.outbound.send(Message::Close(None)).is_ok() {
            let _ = tokio::time::timeout(CLOSE_GRACE, &mut self.writer).await;
        }
        tracing::info!("Connection to relay closed");
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
