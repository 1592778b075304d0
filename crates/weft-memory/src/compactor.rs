use crate::transcript::{prune_tool_outputs, render_transcript};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use weft_agent::MemoryHook;
use weft_core::{Message, WeftResult};
use weft_llm::ChatModel;

/// Sentinel `name` carried by the synthetic summary message, so an earlier
/// summary is recognized and folded into the next one instead of stacking.
pub const SUMMARY_NAME: &str = "history_summary";

/// Fixed prefix of the summary message content.
pub const SUMMARY_MARKER: &str = "[Conversation summary]";

/// Thresholds and windows for history compaction. Crossing any one
/// threshold triggers a compaction pass.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Message-count trigger.
    pub max_messages: usize,
    /// Total content characters trigger.
    pub max_total_chars: usize,
    /// Estimated prompt-token trigger (chars / 4).
    pub max_prompt_tokens: usize,
    /// Number of most recent messages kept verbatim.
    pub keep_tail_messages: usize,
    /// Number of most recent tool results spared from pruning.
    pub tool_keep_last: usize,
    /// Maximum characters retained per pruned tool result.
    pub tool_max_chars: usize,
    /// Maximum characters per transcript block fed to the summarizer.
    pub segment_max_chars: usize,
    /// Upper bound on one summarization call.
    pub summarize_timeout: Duration,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_messages: 64,
            max_total_chars: 120_000,
            max_prompt_tokens: 80_000,
            keep_tail_messages: 8,
            tool_keep_last: 4,
            tool_max_chars: 2_000,
            segment_max_chars: 8_000,
            summarize_timeout: Duration::from_secs(60),
        }
    }
}

/// Produces a prose summary of a conversation transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> WeftResult<String>;
}

/// [`Summarizer`] backed by a chat model.
pub struct ModelSummarizer {
    model: Arc<dyn ChatModel>,
}

impl ModelSummarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&self, transcript: &str) -> WeftResult<String> {
        let messages = [
            Message::system(
                "Summarize the following conversation transcript. Preserve decisions, \
                 open tasks, tool outcomes, and any constraints stated by the user. \
                 Be concise; omit pleasantries.",
            ),
            Message::user(transcript),
        ];
        let reply = self.model.complete(&messages, &[]).await?;
        Ok(reply.content)
    }
}

/// Compacts a conversation in place once it outgrows the configured
/// budgets: the head (system prompt and the first user message) and a tail
/// window survive verbatim, everything between is replaced by one summary
/// message.
pub struct Compactor {
    summarizer: Arc<dyn Summarizer>,
    config: CompactionConfig,
}

impl Compactor {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: CompactionConfig) -> Self {
        Self { summarizer, config }
    }

    fn over_budget(&self, messages: &[Message]) -> bool {
        let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        messages.len() >= self.config.max_messages
            || total_chars >= self.config.max_total_chars
            || total_chars / 4 >= self.config.max_prompt_tokens
    }

    /// Runs one compaction pass if a budget is exceeded. Returns whether the
    /// history was rewritten. Summarization failures are logged and leave
    /// the history untouched, so a flaky summarizer never loses messages.
    pub async fn maybe_compact(&self, messages: &mut Vec<Message>) -> WeftResult<bool> {
        if messages.len() <= 3 || !self.over_budget(messages) {
            return Ok(false);
        }

        // messages[0] (system) and messages[1] (the original task) are
        // never summarized away.
        let head_end = 2;
        let tail_start = messages
            .len()
            .saturating_sub(self.config.keep_tail_messages)
            .max(head_end);
        let middle = &messages[head_end..tail_start];
        if middle.is_empty() {
            return Ok(false);
        }
        // An existing summary sits at the start of the middle; when nothing
        // new has accumulated in front of the tail there is no work to do.
        if middle.len() == 1 && middle[0].name.as_deref() == Some(SUMMARY_NAME) {
            return Ok(false);
        }

        prune_tool_outputs(
            &mut messages[head_end..tail_start],
            self.config.tool_keep_last,
            self.config.tool_max_chars,
        );
        let transcript = render_transcript(
            &messages[head_end..tail_start],
            self.config.segment_max_chars,
        );
        debug!(
            middle = tail_start - head_end,
            transcript_chars = transcript.len(),
            "summarizing history"
        );

        let summary_text =
            match tokio::time::timeout(self.config.summarize_timeout, async {
                self.summarizer.summarize(&transcript).await
            })
            .await
            {
                Ok(Ok(text)) if !text.trim().is_empty() => text,
                Ok(Ok(_)) => {
                    warn!("summarizer returned an empty summary, keeping history as-is");
                    return Ok(false);
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "summarization failed, keeping history as-is");
                    return Ok(false);
                }
                Err(_) => {
                    warn!("summarization timed out, keeping history as-is");
                    return Ok(false);
                }
            };

        let mut summary = Message::assistant(format!("{SUMMARY_MARKER}\n{summary_text}"));
        summary.name = Some(SUMMARY_NAME.to_string());

        let before = messages.len();
        let mut compacted = Vec::with_capacity(head_end + 1 + (before - tail_start));
        compacted.extend_from_slice(&messages[..head_end]);
        compacted.push(summary);
        compacted.extend_from_slice(&messages[tail_start..]);
        *messages = compacted;

        info!(before, after = messages.len(), "history compacted");
        Ok(true)
    }
}

#[async_trait]
impl MemoryHook for Compactor {
    async fn refresh(&self, messages: &mut Vec<Message>) -> WeftResult<()> {
        self.maybe_compact(messages).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use weft_core::ToolSchema;

    struct CannedModel {
        requests: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolSchema],
        ) -> WeftResult<Message> {
            self.requests.lock().unwrap().push(messages.to_vec());
            Ok(Message::assistant("condensed history"))
        }
    }

    #[tokio::test]
    async fn test_model_summarizer_wraps_transcript_in_a_prompt() {
        let model = Arc::new(CannedModel {
            requests: Mutex::new(Vec::new()),
        });
        let summarizer = ModelSummarizer::new(model.clone());

        let summary = summarizer.summarize("[user] hello").await.unwrap();
        assert_eq!(summary, "condensed history");

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, weft_core::Role::System);
        assert_eq!(requests[0][1].content, "[user] hello");
    }
}
