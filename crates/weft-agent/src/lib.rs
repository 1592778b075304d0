//! The tool-calling agent loop: model, tool registry, and the runner that
//! alternates between them until the model produces a final answer.

pub mod registry;
pub mod runner;
pub mod tool;

pub use registry::ToolRegistry;
pub use runner::{Agent, AgentConfig, LoopState, MemoryHook};
pub use tool::Tool;
