//! Mamalink relay server and wire protocol.
//!
//! The relay routes consultation chat messages between a doctor and a
//! patient. The client crate reuses the domain value objects and the
//! WebSocket DTOs defined here.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::{run, serve};
