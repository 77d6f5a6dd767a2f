//! Client-side domain model: identities, messages as displayed, and the
//! explicit connection state.

pub mod backoff;
pub mod connection;
pub mod identity;
pub mod message;

pub use backoff::ReconnectPolicy;
pub use connection::{ConnectionState, HistoryState, UnavailableReason};
pub use identity::Identity;
pub use message::{Author, DeliveryMark, Message};
