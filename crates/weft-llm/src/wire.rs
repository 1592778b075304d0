//! Translation between [`Message`] lists and the OpenAI chat wire format.

use serde_json::{json, Value};
use weft_core::{Message, Role, TokenUsage, ToolCall, ToolSchema, WeftError, WeftResult};

/// Why the provider stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FinishReason {
    /// Natural completion.
    Stop,
    /// Cut off by the token limit; the response is a partial fragment.
    Length,
    /// The model requested tool execution.
    ToolCalls,
    /// The provider reported something else.
    Other(String),
    /// No finish reason was reported; treated as incomplete.
    Missing,
}

impl FinishReason {
    pub(crate) fn parse(value: &Value) -> Self {
        match value.as_str() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("null") | None => FinishReason::Missing,
            Some(other) => FinishReason::Other(other.to_string()),
        }
    }

    /// Whether the generation should be continued with another request.
    pub(crate) fn needs_continuation(&self) -> bool {
        matches!(self, FinishReason::Length | FinishReason::Missing)
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// Converts a message list into the provider payload.
///
/// Content is whitespace-trimmed; messages left empty that carry neither
/// tool calls nor a tool_call_id are dropped to avoid invalid requests.
pub fn format_input(messages: &[Message]) -> Vec<Value> {
    let mut payload = Vec::with_capacity(messages.len());
    for message in messages {
        let content = message.content.trim();
        if content.is_empty() && !message.has_tool_calls() && message.tool_call_id.is_none() {
            continue;
        }

        let mut entry = json!({
            "role": role_str(message.role),
            "content": content,
        });
        if let Some(calls) = &message.tool_calls {
            if !calls.is_empty() {
                entry["tool_calls"] = Value::Array(calls.iter().map(format_tool_call).collect());
            }
        }
        if let Some(call_id) = &message.tool_call_id {
            entry["tool_call_id"] = json!(call_id);
        }
        if message.partial {
            // Continuation convention: resubmit the truncated fragment
            // marked partial so the provider resumes instead of restarting.
            entry["partial"] = json!(true);
        }
        payload.push(entry);
    }
    payload
}

fn format_tool_call(call: &ToolCall) -> Value {
    json!({
        "id": call.id,
        "type": call.call_type,
        "function": {
            "name": call.tool_name,
            "arguments": call.arguments,
        }
    })
}

/// Converts tool schemas into the OpenAI function-tool array.
pub fn format_tools(tools: &[ToolSchema]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect()
}

fn parse_usage(value: &Value) -> TokenUsage {
    TokenUsage {
        prompt_tokens: value["prompt_tokens"].as_u64().unwrap_or(0),
        completion_tokens: value["completion_tokens"].as_u64().unwrap_or(0),
        cached_tokens: value["prompt_tokens_details"]["cached_tokens"]
            .as_u64()
            .unwrap_or(0),
        cache_creation_input_tokens: value["cache_creation_input_tokens"].as_u64().unwrap_or(0),
        api_calls: 1,
    }
}

fn parse_tool_call(value: &Value, fallback_index: u32) -> ToolCall {
    ToolCall {
        id: value["id"].as_str().unwrap_or_default().to_string(),
        tool_name: value["function"]["name"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        arguments: value["function"]["arguments"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        call_type: value["type"].as_str().unwrap_or("function").to_string(),
        index: value["index"]
            .as_u64()
            .map_or(fallback_index, |idx| idx as u32),
    }
}

/// Parses a non-streaming completion body into a finalized assistant
/// message and its finish reason.
pub(crate) fn parse_completion(body: &Value) -> WeftResult<(Message, FinishReason)> {
    let choice = &body["choices"][0];
    if choice.is_null() {
        return Err(WeftError::Llm(format!(
            "completion has no choices: {body}"
        )));
    }
    let wire_message = &choice["message"];

    let mut message = Message::assistant(
        wire_message["content"].as_str().unwrap_or_default(),
    );
    message.reasoning_content = wire_message["reasoning_content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if let Some(calls) = wire_message["tool_calls"].as_array() {
        if !calls.is_empty() {
            message.tool_calls = Some(
                calls
                    .iter()
                    .enumerate()
                    .map(|(idx, call)| parse_tool_call(call, idx as u32))
                    .collect(),
            );
        }
    }
    message.id = body["id"].as_str().map(ToString::to_string);
    message.usage = parse_usage(&body["usage"]);

    Ok((message, FinishReason::parse(&choice["finish_reason"])))
}

/// One parsed streaming chunk: the delta folded into message shape, plus
/// the finish reason when the chunk carries one.
pub(crate) struct StreamChunk {
    pub(crate) message: Message,
    pub(crate) finish: Option<FinishReason>,
}

/// Parses one SSE `data:` event into a delta message.
///
/// Chunks without choices (e.g. trailing usage-only chunks) yield an empty
/// delta so usage still accumulates.
pub(crate) fn parse_chunk(body: &Value) -> StreamChunk {
    let choice = &body["choices"][0];
    let delta = &choice["delta"];

    let mut message = Message::assistant(delta["content"].as_str().unwrap_or_default());
    message.reasoning_content = delta["reasoning_content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if let Some(calls) = delta["tool_calls"].as_array() {
        if !calls.is_empty() {
            message.tool_calls = Some(
                calls
                    .iter()
                    .enumerate()
                    .map(|(idx, call)| parse_tool_call(call, idx as u32))
                    .collect(),
            );
        }
    }
    message.id = body["id"].as_str().map(ToString::to_string);
    if !body["usage"].is_null() {
        message.usage = parse_usage(&body["usage"]);
    }

    let finish = if choice["finish_reason"].is_null() {
        None
    } else {
        Some(FinishReason::parse(&choice["finish_reason"]))
    };

    StreamChunk { message, finish }
}
