use crate::config::LlmConfig;
use crate::merge::{merge_fragment, push_partial, StreamAccumulator};
use crate::retry::{compute_backoff, is_retryable};
use crate::wire::{self, FinishReason};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use weft_core::{Message, ToolSchema, WeftError, WeftResult};

/// Narrow seam over a chat-completion model, used by the agent loop and the
/// history summarizer so both can be driven by mocks in tests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generates one finalized assistant message for the conversation.
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> WeftResult<Message>;
}

/// Client for OpenAI-compatible chat completion APIs.
///
/// Works with OpenAI, OpenRouter, DashScope, Groq, Ollama, and any other
/// provider implementing the chat completions wire format.
#[derive(Clone)]
pub struct OpenAiClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Creates a client from a validated [`LlmConfig`].
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn request_body(&self, messages: &[Message], tools: &[ToolSchema], stream: bool) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": wire::format_input(messages),
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        if !tools.is_empty() {
            body["tools"] = Value::Array(wire::format_tools(tools));
        }
        if stream {
            body["stream"] = json!(true);
            // Without this, OpenAI-compatible providers omit the trailing
            // usage chunk and streamed messages carry zero usage.
            body["stream_options"] = json!({"include_usage": true});
        }
        body
    }

    /// Posts one completion request, retrying transient failures with
    /// capped exponential backoff.
    async fn post_completion(&self, body: &Value) -> WeftResult<reqwest::Response> {
        let url = self.config.completions_url();
        let mut attempt = 0u32;
        loop {
            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send()
                .await;

            let err = match result {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "unknown error".to_string());
                    WeftError::Llm(format!("provider returned {status}: {text}"))
                }
                Err(e) => WeftError::Llm(format!("request failed: {e}")),
            };

            if !is_retryable(&err) || attempt >= self.config.retry.max_retries {
                return Err(err);
            }
            let delay = compute_backoff(&self.config.retry, attempt);
            warn!(attempt, delay_ms = delay, error = %err, "retryable provider error, backing off");
            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }

    /// Non-streaming generation.
    ///
    /// When the provider signals truncation (`finish_reason == length`, or
    /// no finish reason at all), the partial fragment is marked and fed
    /// back, and generation continues — up to `max_continuations` rounds —
    /// before all fragments are merged into one logical message.
    pub async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> WeftResult<Message> {
        let mut conversation = messages.to_vec();
        let mut rounds = 0u32;
        loop {
            let body = self.request_body(&conversation, tools, false);
            let resp = self.post_completion(&body).await?;
            let payload: Value = resp
                .json()
                .await
                .map_err(|e| WeftError::Llm(format!("invalid completion body: {e}")))?;
            let (message, finish) = wire::parse_completion(&payload)?;

            if finish.needs_continuation() && rounds < self.config.max_continuations {
                rounds += 1;
                info!(?finish, rounds, "completion truncated, continuing");
                push_partial(&mut conversation, message);
                continue;
            }
            if finish.needs_continuation() {
                warn!(
                    rounds,
                    "continuation budget exhausted, returning merged fragments"
                );
            }
            return Ok(Self::take_final(&mut conversation, message));
        }
    }

    /// Merges the final fragment with any pending partial tail.
    fn take_final(conversation: &mut Vec<Message>, fragment: Message) -> Message {
        match conversation.last() {
            Some(tail) if tail.partial => {
                let mut merged = conversation
                    .pop()
                    .unwrap_or_else(|| Message::assistant(""));
                merge_fragment(&mut merged, fragment);
                merged.partial = false;
                merged
            }
            _ => fragment,
        }
    }

    /// Streaming generation.
    ///
    /// Returns a receiver of progressively-merged message snapshots (one
    /// per provider chunk) plus a join handle yielding the final merged
    /// message. Truncation continuation applies here as well, bounded by
    /// the same round cap; snapshots sent after a continuation include all
    /// earlier fragments.
    pub fn generate_stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSchema>,
    ) -> (mpsc::Receiver<Message>, JoinHandle<WeftResult<Message>>) {
        let (tx, rx) = mpsc::channel::<Message>(256);
        let client = self.clone();
        let handle = tokio::spawn(async move { client.run_stream(messages, tools, tx).await });
        (rx, handle)
    }

    async fn run_stream(
        &self,
        mut conversation: Vec<Message>,
        tools: Vec<ToolSchema>,
        tx: mpsc::Sender<Message>,
    ) -> WeftResult<Message> {
        let mut total: Option<Message> = None;
        let mut rounds = 0u32;
        loop {
            let body = self.request_body(&conversation, &tools, true);
            let resp = self.post_completion(&body).await?;

            let mut acc = StreamAccumulator::new();
            let mut finish = FinishReason::Missing;
            let mut byte_stream = resp.bytes_stream();
            let mut buffer = LineBuffer::new();

            while let Some(chunk) = byte_stream.next().await {
                let bytes =
                    chunk.map_err(|e| WeftError::Llm(format!("stream read error: {e}")))?;
                buffer.extend(&bytes);

                while let Some(line) = buffer.next_line() {
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        continue;
                    }
                    let Ok(event) = serde_json::from_str::<Value>(data) else {
                        continue;
                    };

                    let parsed = wire::parse_chunk(&event);
                    if let Some(reason) = parsed.finish {
                        finish = reason;
                    }
                    acc.fold(parsed.message)?;

                    // Receiver may have been dropped; the final message is
                    // still produced through the join handle.
                    let _ = tx.send(Self::combined(&total, &acc)).await;
                }
            }

            let fragment = acc.into_message();
            match &mut total {
                Some(merged) => merge_fragment(merged, fragment.clone()),
                None => total = Some(fragment.clone()),
            }

            if finish.needs_continuation() && rounds < self.config.max_continuations {
                rounds += 1;
                info!(?finish, rounds, "stream truncated, continuing");
                push_partial(&mut conversation, fragment);
                continue;
            }
            if finish.needs_continuation() {
                warn!(
                    rounds,
                    "continuation budget exhausted, returning merged fragments"
                );
            }
            let mut message = total.unwrap_or_else(|| Message::assistant(""));
            message.partial = false;
            return Ok(message);
        }
    }

    fn combined(total: &Option<Message>, acc: &StreamAccumulator) -> Message {
        match total {
            Some(merged) => {
                let mut snapshot = merged.clone();
                merge_fragment(&mut snapshot, acc.snapshot());
                snapshot
            }
            None => acc.snapshot(),
        }
    }
}

/// Accumulates raw transport bytes and yields complete, trimmed SSE lines.
/// Decoding happens per line, never per chunk, so a multi-byte character
/// the transport splits across two chunks is reassembled before decoding.
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line[..pos]).trim().to_string())
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> WeftResult<Message> {
        self.generate(messages, tools).await
    }
}
