use crate::tool::ToolCall;
use serde::{Deserialize, Serialize};

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A system-level instruction or prompt.
    System,
    /// A human end-user (or, in a workflow, the task input).
    User,
    /// The AI assistant.
    Assistant,
    /// Output produced by a tool invocation.
    Tool,
}

/// Token accounting reported by the provider, accumulated across the HTTP
/// calls that produced one logical message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt of the request(s).
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens generated by the model.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Prompt tokens served from the provider's cache.
    #[serde(default)]
    pub cached_tokens: u64,
    /// Tokens written into the provider's cache by this request.
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Number of HTTP calls merged into this message (continuation rounds
    /// count individually).
    #[serde(default)]
    pub api_calls: u64,
}

impl TokenUsage {
    /// Accumulates another usage record into this one.
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.cached_tokens += other.cached_tokens;
        self.cache_creation_input_tokens += other.cache_creation_input_tokens;
        self.api_calls += other.api_calls;
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single message exchanged within a conversation.
///
/// Created by the LLM client when parsing a provider completion, or
/// accumulated chunk-by-chunk in streaming mode. Owned exclusively by the
/// conversation it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The textual content. May be appended to incrementally during
    /// streaming merges and continuation-after-truncation.
    pub content: String,
    /// Provider-specific internal reasoning text, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reasoning_content: String,
    /// Tool invocations requested by an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// For tool-role messages: the id of the [`ToolCall`] this result
    /// answers. Must be non-empty on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Opaque provider-assigned completion identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Optional label: the tool name on tool messages, or a sentinel such
    /// as `history_summary` on synthetic messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Accumulated token accounting for this message.
    #[serde(default)]
    pub usage: TokenUsage,
    /// True while this assistant message is an in-progress continuation
    /// fragment. Transient: defaults to false on reconstruction.
    #[serde(default, skip_serializing_if = "is_false")]
    pub partial: bool,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning_content: String::new(),
            tool_calls: None,
            tool_call_id: None,
            id: None,
            name: None,
            usage: TokenUsage::default(),
            partial: false,
        }
    }

    /// Creates a new message with [`Role::System`].
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a tool-result message answering the call with id
    /// `tool_call_id`, labelled with the tool's name.
    pub fn tool(
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        let mut message = Self::new(Role::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message.name = Some(tool_name.into());
        message
    }

    /// Whether this assistant message requests tool execution. An assistant
    /// message with tool calls is never a terminal response.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::tool::ToolCall;

    #[test]
    fn test_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.partial);

        let tool_msg = Message::tool("output", "call_1", "search");
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.name.as_deref(), Some("search"));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut msg = Message::assistant("answer");
        msg.reasoning_content = "thinking".into();
        msg.id = Some("chatcmpl-123".into());
        msg.tool_calls = Some(vec![ToolCall {
            id: "call_1".into(),
            tool_name: "search".into(),
            arguments: "{\"q\":\"rust\"}".into(),
            call_type: "function".into(),
            index: 0,
        }]);
        msg.usage.prompt_tokens = 42;
        msg.usage.api_calls = 2;

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_partial_defaults_to_false() {
        // A partial message round-trips, and the flag defaults when absent.
        let mut msg = Message::assistant("fragment");
        msg.partial = true;
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"partial\":true"));

        let bare: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"done"}"#).unwrap();
        assert!(!bare.partial);
        assert_eq!(bare.usage, TokenUsage::default());
    }

    #[test]
    fn test_has_tool_calls() {
        let mut msg = Message::assistant("");
        assert!(!msg.has_tool_calls());
        msg.tool_calls = Some(vec![]);
        assert!(!msg.has_tool_calls());
        msg.tool_calls = Some(vec![ToolCall {
            id: "call_1".into(),
            tool_name: "search".into(),
            arguments: "{}".into(),
            call_type: "function".into(),
            index: 0,
        }]);
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_usage_accumulation() {
        let mut usage = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            api_calls: 1,
            ..Default::default()
        };
        usage.add(&TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 7,
            cached_tokens: 3,
            api_calls: 1,
            ..Default::default()
        });
        assert_eq!(usage.prompt_tokens, 30);
        assert_eq!(usage.completion_tokens, 12);
        assert_eq!(usage.cached_tokens, 3);
        assert_eq!(usage.api_calls, 2);
    }
}
