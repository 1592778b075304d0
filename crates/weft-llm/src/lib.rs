//! LLM client adapter for OpenAI-compatible chat completion APIs.
//!
//! Translates [`weft_core::Message`] lists into the provider wire format,
//! invokes the provider with bounded retries, and translates the result
//! back — merging streamed chunks into progressively-complete message
//! snapshots and transparently continuing completions that were cut off by
//! the provider's token limit.

mod client;
mod config;
mod merge;
mod retry;
mod wire;

pub use client::{ChatModel, OpenAiClient};
pub use config::LlmConfig;
pub use retry::{is_retryable, RetryPolicy};
pub use wire::{format_input, format_tools};
