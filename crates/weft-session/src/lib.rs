//! Conversation state and JSON-file persistence.

pub mod conversation;
pub mod store;

pub use conversation::Conversation;
pub use store::{ConversationStore, FileConversationStore};
