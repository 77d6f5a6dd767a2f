//! Shared utilities for Mamalink.
//!
//! Used by both the relay server and the chat client.

pub mod logger;
pub mod time;
