//! Terminal presentation of a chat session.

use std::{
    collections::HashSet,
    io::{self, Write},
};

use mamalink_server::domain::{ClientNonce, MessageId, UserId};
use mamalink_shared::time::format_clock;

use crate::{
    domain::{Author, DeliveryMark, Message, UnavailableReason},
    session::{ChatSession, PendingStatus},
};

/// Receives session updates after every handled input.
pub trait ChatObserver {
    fn render(&mut self, session: &ChatSession);

    /// The composer field should be emptied.
    fn input_cleared(&mut self) {}

    fn unavailable(&mut self, _reason: &UnavailableReason) {}
}

/// One display line for a message.
pub fn format_line(message: &Message, counterpart: &UserId) -> String {
    let clock = format_clock(message.timestamp.value());
    match message.author {
        Author::Own => {
            let mark = match message.delivery_mark() {
                Some(DeliveryMark::Read) => "✓✓",
                _ => "✓",
            };
            format!("[{clock}] {:>12}: {} {mark}", "you", message.content)
        }
        Author::Counterpart if &message.sender_id == counterpart => {
            format!("[{clock}] {counterpart}: {}", message.content)
        }
        Author::Counterpart => format!("[{clock}] {}: {}", message.sender_id, message.content),
        Author::System => format!("[{clock}] *** {}", message.content),
    }
}

/// Prints the conversation as it grows.
pub struct TerminalView<W: Write> {
    out: W,
    counterpart: UserId,
    /// Number of messages already printed.
    printed: usize,
    /// History generation the printed lines belong to.
    generation: u64,
    read_shown: HashSet<MessageId>,
    failed_shown: HashSet<ClientNonce>,
    last_status: Option<&'static str>,
}

impl TerminalView<io::Stdout> {
    pub fn stdout(counterpart: UserId) -> Self {
        Self::new(io::stdout(), counterpart)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, counterpart: UserId) -> Self {
        Self {
            out,
            counterpart,
            printed: 0,
            generation: 0,
            read_shown: HashSet::new(),
            failed_shown: HashSet::new(),
            last_status: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write> ChatObserver for TerminalView<W> {
    fn render(&mut self, session: &ChatSession) {
        let status = session.state().label();
        if self.last_status != Some(status) {
            self.last_status = Some(status);
            self.line(&format!("-- {status} --"));
        }

        let messages = session.messages();
        if session.history_generation() != self.generation {
            // the list was rebuilt, possibly with messages missed while offline
            if self.generation > 0 {
                self.line("-- conversation reloaded --");
            }
            self.generation = session.history_generation();
            self.printed = 0;
            self.read_shown.clear();
        }

        let mut lines = Vec::new();
        for message in &messages[..self.printed] {
            if message.delivery_mark() == Some(DeliveryMark::Read)
                && self.read_shown.insert(message.id.clone())
            {
                lines.push(format!("    ✓✓ read: {}", message.content));
            }
        }
        for message in &messages[self.printed..] {
            lines.push(format_line(message, &self.counterpart));
            if message.delivery_mark() == Some(DeliveryMark::Read) {
                self.read_shown.insert(message.id.clone());
            }
        }
        self.printed = messages.len();

        let pending = session.pending();
        self.failed_shown
            .retain(|nonce| pending.iter().any(|p| &p.nonce == nonce));
        for pending in pending {
            if pending.status == PendingStatus::Failed
                && self.failed_shown.insert(pending.nonce.clone())
            {
                lines.push(format!("    !! not delivered: {}", pending.content));
            }
        }

        for line in lines {
            self.line(&line);
        }
    }

    fn unavailable(&mut self, reason: &UnavailableReason) {
        self.line(&format!("!! chat unavailable: {reason}"));
    }
}
