//! Who is talking to whom.

use mamalink_server::domain::{Role, UserId};

/// Local user and the counterpart of this chat screen.
///
/// Both ids come from configuration; the session never derives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub local: UserId,
    pub role: Role,
    pub counterpart: UserId,
}

impl Identity {
    pub fn new(local: UserId, role: Role, counterpart: UserId) -> Self {
        Self {
            local,
            role,
            counterpart,
        }
    }

    /// Whether a message from `sender` (addressed to `receiver`, when the
    /// relay says) belongs on this screen.
    ///
    /// Only the two participants and the system sentinel may author; only
    /// the two participants may be addressed.
    pub fn admits(&self, sender: &UserId, receiver: Option<&str>) -> bool {
        let party = |id: &str| id == self.local.as_str() || id == self.counterpart.as_str();
        let sender_ok = party(sender.as_str()) || sender.is_system();
        sender_ok && receiver.is_none_or(party)
    }
}
