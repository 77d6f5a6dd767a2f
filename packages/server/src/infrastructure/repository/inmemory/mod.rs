//! インメモリ Repository 実装

mod conversation;

pub use conversation::InMemoryConversationRepository;
