//! Merging of streamed chunks and continuation fragments into one logical
//! assistant message.

use weft_core::{Message, WeftError, WeftResult};

/// Folds streamed delta messages into a progressively-complete message.
///
/// Tool-call deltas are merged by `index`: a chunk repeating the last seen
/// index contributes argument fragments to that call; a higher index opens
/// a new call. Indices must be monotonically non-decreasing within one
/// provider response — a lower index is rejected rather than silently
/// merged into the wrong call.
pub(crate) struct StreamAccumulator {
    message: Message,
    last_index: Option<u32>,
}

impl StreamAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            message: Message::assistant(""),
            last_index: None,
        }
    }

    /// Folds one delta into the accumulator.
    pub(crate) fn fold(&mut self, chunk: Message) -> WeftResult<()> {
        self.message.content.push_str(&chunk.content);
        self.message
            .reasoning_content
            .push_str(&chunk.reasoning_content);
        if self.message.id.is_none() {
            self.message.id = chunk.id;
        }
        self.message.usage.add(&chunk.usage);

        let Some(deltas) = chunk.tool_calls else {
            return Ok(());
        };
        for delta in deltas {
            match self.last_index {
                Some(last) if delta.index == last => {
                    let calls = self.message.tool_calls.get_or_insert_with(Vec::new);
                    let Some(current) = calls.last_mut() else {
                        return Err(WeftError::Llm(
                            "tool call delta arrived before any call was opened".into(),
                        ));
                    };
                    if !delta.id.is_empty() {
                        current.id = delta.id;
                    }
                    if !delta.tool_name.is_empty() {
                        current.tool_name = delta.tool_name;
                    }
                    current.arguments.push_str(&delta.arguments);
                }
                Some(last) if delta.index < last => {
                    return Err(WeftError::Llm(format!(
                        "out-of-order tool call index {} after {} in stream",
                        delta.index, last
                    )));
                }
                _ => {
                    self.last_index = Some(delta.index);
                    self.message
                        .tool_calls
                        .get_or_insert_with(Vec::new)
                        .push(delta);
                }
            }
        }
        Ok(())
    }

    /// A clone of the merged message so far.
    pub(crate) fn snapshot(&self) -> Message {
        self.message.clone()
    }

    pub(crate) fn into_message(self) -> Message {
        self.message
    }
}

/// Merges a continuation fragment into an earlier fragment of the same
/// logical message: text is concatenated, tool calls appended, usage
/// accumulated.
pub(crate) fn merge_fragment(into: &mut Message, fragment: Message) {
    into.content.push_str(&fragment.content);
    into.reasoning_content.push_str(&fragment.reasoning_content);
    if into.id.is_none() {
        into.id = fragment.id;
    }
    into.usage.add(&fragment.usage);
    if let Some(calls) = fragment.tool_calls {
        if !calls.is_empty() {
            into.tool_calls.get_or_insert_with(Vec::new).extend(calls);
        }
    }
}

/// Appends a truncated fragment to the conversation tail for the next
/// continuation request, merging into an already-pending partial message
/// if one exists.
pub(crate) fn push_partial(conversation: &mut Vec<Message>, mut fragment: Message) {
    match conversation.last_mut() {
        Some(tail) if tail.partial => merge_fragment(tail, fragment),
        _ => {
            fragment.partial = true;
            conversation.push(fragment);
        }
    }
}
