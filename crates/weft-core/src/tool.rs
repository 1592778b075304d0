use serde::{Deserialize, Serialize};

fn default_call_type() -> String {
    "function".to_string()
}

/// A request from the LLM to invoke a specific tool.
///
/// OpenAI-style providers transmit `arguments` as a JSON-encoded string
/// that may arrive split across stream chunks; fragments are concatenated
/// by matching `index` before the string is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation key assigned by the provider for this call.
    #[serde(default)]
    pub id: String,
    /// Name of the tool to invoke.
    #[serde(default)]
    pub tool_name: String,
    /// JSON-encoded argument string, possibly accumulated across chunks.
    #[serde(default)]
    pub arguments: String,
    /// Provider discriminator, normally `"function"`.
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    /// Position within the parent message's tool_calls list; used to merge
    /// streamed deltas into the correct call.
    #[serde(default)]
    pub index: u32,
}

/// The result returned after executing a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The id of the [`ToolCall`] this result corresponds to.
    pub call_id: String,
    /// The textual output produced by the tool (or the error text).
    pub content: String,
    /// Whether the tool execution ended in an error.
    pub is_error: bool,
}

impl ToolResult {
    /// Creates a successful tool result.
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Creates an error tool result. Tool failures are recoverable by
    /// default: the text is fed back to the model as a normal result.
    pub fn error(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// Metadata describing a tool's interface, advertised to the model when
/// building a request's tool list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("call_1", "output");
        assert!(!ok.is_error);
        assert_eq!(ok.content, "output");

        let err = ToolResult::error("call_1", "failed");
        assert!(err.is_error);
    }

    #[test]
    fn test_tool_call_type_defaults() {
        let call: ToolCall =
            serde_json::from_str(r#"{"id":"c1","tool_name":"search","arguments":"{}"}"#).unwrap();
        assert_eq!(call.call_type, "function");
        assert_eq!(call.index, 0);

        let json = serde_json::to_string(&call).unwrap();
        assert!(json.contains("\"type\":\"function\""));
    }
}
