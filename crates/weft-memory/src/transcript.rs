//! Flattening a message region into a plain-text transcript, and pruning of
//! stale tool outputs ahead of summarization.

use weft_core::{Message, Role};

/// Marker spliced into a truncated tool output.
pub(crate) const ELISION_MARKER: &str = "\n... [output elided] ...\n";

fn role_label(message: &Message) -> String {
    match message.role {
        Role::System => "system".to_string(),
        Role::User => "user".to_string(),
        Role::Assistant => "assistant".to_string(),
        Role::Tool => match &message.name {
            Some(name) => format!("tool:{name}"),
            None => "tool".to_string(),
        },
    }
}

/// Truncates `text` to at most `max_chars` characters by keeping the head
/// and tail halves and splicing an elision marker between them. Operates on
/// char boundaries.
pub(crate) fn truncate_middle(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    let head = max_chars / 2;
    let tail = max_chars - head;
    let mut out: String = chars[..head].iter().collect();
    out.push_str(ELISION_MARKER);
    out.extend(&chars[chars.len() - tail..]);
    out
}

/// Shortens the bodies of tool-result messages, sparing the most recent
/// `keep_last` tool messages in the slice. Old tool output is the bulk of
/// a long history and the least useful to a summarizer verbatim.
pub(crate) fn prune_tool_outputs(messages: &mut [Message], keep_last: usize, max_chars: usize) {
    let tool_positions: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == Role::Tool)
        .map(|(idx, _)| idx)
        .collect();
    let protected_from = tool_positions.len().saturating_sub(keep_last);
    for &idx in &tool_positions[..protected_from] {
        let message = &mut messages[idx];
        if message.content.chars().count() > max_chars {
            message.content = truncate_middle(&message.content, max_chars);
        }
    }
}

/// Renders messages as a role-tagged transcript, each block capped at
/// `segment_max_chars`.
pub(crate) fn render_transcript(messages: &[Message], segment_max_chars: usize) -> String {
    let mut blocks = Vec::with_capacity(messages.len());
    for message in messages {
        let mut body = message.content.trim().to_string();
        if body.is_empty() {
            if let Some(calls) = &message.tool_calls {
                let names: Vec<&str> = calls.iter().map(|c| c.tool_name.as_str()).collect();
                body = format!("(requested tools: {})", names.join(", "));
            } else {
                continue;
            }
        }
        let body = truncate_middle(&body, segment_max_chars);
        blocks.push(format!("[{}] {}", role_label(message), body));
    }
    blocks.join("\n\n")
}
