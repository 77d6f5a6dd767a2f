//! Messages sent but not yet echoed back by the relay.

use std::time::{Duration, Instant};

use mamalink_server::domain::ClientNonce;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    Pending,
    /// No echo within the acknowledgement timeout.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub nonce: ClientNonce,
    pub content: String,
    pub sent_at: Instant,
    pub status: PendingStatus,
}

/// Failed drafts kept on screen; older ones are dropped first.
pub const MAX_FAILED_DRAFTS: usize = 20;

/// Pending sends in submission order.
#[derive(Debug, Default)]
pub struct Outbox {
    entries: Vec<PendingMessage>,
}

impl Outbox {
    pub fn push(&mut self, nonce: ClientNonce, content: String, now: Instant) {
        self.entries.push(PendingMessage {
            nonce,
            content,
            sent_at: now,
            status: PendingStatus::Pending,
        });
    }

    /// Remove the entry matching an own echo.
    ///
    /// An echo carrying a nonce only matches that nonce. Without one, the
    /// oldest entry with identical content matches.
    pub fn reconcile(&mut self, nonce: Option<&ClientNonce>, content: &str) -> Option<PendingMessage> {
        let index = match nonce {
            Some(nonce) => self.entries.iter().position(|e| &e.nonce == nonce),
            None => self.entries.iter().position(|e| e.content == content),
        }?;
        Some(self.entries.remove(index))
    }

    /// Flag entries older than `timeout` as failed and return the newly failed ones.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<PendingMessage> {
        let mut failed = Vec::new();
        for entry in &mut self.entries {
            if entry.status == PendingStatus::Pending
                && now.saturating_duration_since(entry.sent_at) >= timeout
            {
                entry.status = PendingStatus::Failed;
                failed.push(entry.clone());
            }
        }
        if !failed.is_empty() {
            self.drop_excess_failed();
        }
        failed
    }

    fn drop_excess_failed(&mut self) {
        let failed = self
            .entries
            .iter()
            .filter(|e| e.status == PendingStatus::Failed)
            .count();
        let mut excess = failed.saturating_sub(MAX_FAILED_DRAFTS);
        if excess == 0 {
            return;
        }
        tracing::debug!("Dropping {} oldest failed drafts", excess);
        self.entries.retain(|e| {
            if excess > 0 && e.status == PendingStatus::Failed {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    pub fn entries(&self) -> &[PendingMessage] {
        &self.entries
    }
}
