use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use weft_core::Message;

/// One agent conversation: an ordered message history plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Total characters of message content, used as a cheap size signal.
    pub fn total_chars(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.content.chars().count())
            .sum()
    }

    /// Rough token estimate: roughly four characters per token. Used for
    /// budget checks ahead of the next request, where the provider-reported
    /// count from the previous call would already be stale.
    pub fn estimated_tokens(&self) -> usize {
        self.total_chars() / 4
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
