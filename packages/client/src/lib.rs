//! Mamalink consultation chat client.
//!
//! A Sans-IO [`ChatSession`] holds the protocol rules; [`run_session`] drives it
//! over a WebSocket transport and renders through a [`view::ChatObserver`].

pub mod config;
pub mod domain;
pub mod error;
pub mod input;
pub mod runner;
pub mod session;
pub mod transport;
pub mod view;

pub use config::{ClientConfig, RoomLifecycle, SessionConfig};
pub use error::ClientError;
pub use runner::run_session;
pub use session::{ChatSession, SessionAction, SessionInput};
