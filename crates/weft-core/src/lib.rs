//! Core types and error definitions for the weft framework.
//!
//! This crate provides the foundational types shared across all weft crates:
//! the normalized message model that every other component speaks, the tool
//! call/result pair, and the unified error enum.
//!
//! # Main types
//!
//! - [`WeftError`] — Unified error enum for all weft subsystems.
//! - [`WeftResult`] — Convenience alias for `Result<T, WeftError>`.
//! - [`Role`] — Message role (system, user, assistant, tool).
//! - [`Message`] — One turn in a conversation, including streaming state.
//! - [`ToolCall`] — An LLM-initiated tool invocation request.
//! - [`ToolResult`] — The result returned after executing a tool call.
//! - [`ToolSchema`] — The name/description/parameters triple advertised to
//!   the model when building a request's tool list.

mod error;
mod message;
mod tool;

pub use error::{WeftError, WeftResult};
pub use message::{Message, Role, TokenUsage};
pub use tool::{ToolCall, ToolResult, ToolSchema};
