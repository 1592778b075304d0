//! Built-in tools for weft agents.
//!
//! Currently ships the shared todo plan: a `plan.json` document agents read
//! and update through the `todo_read` and `todo_write` tools, with advisory
//! locking so several agents can share one plan.

/// Plan document types and file-backed storage.
pub mod todo;
/// Plan-reading tool.
pub mod todo_read;
/// Plan-writing tool.
pub mod todo_write;

pub use todo::{TodoItem, TodoPlan, TodoPriority, TodoStatus, TodoStore};
pub use todo_read::TodoReadTool;
pub use todo_write::TodoWriteTool;

use std::sync::Arc;
use weft_agent::ToolRegistry;
use weft_core::WeftResult;

/// Registers the todo tools backed by the given store.
pub fn register_todo_tools(registry: &mut ToolRegistry, store: Arc<TodoStore>) -> WeftResult<()> {
    registry.register(Arc::new(TodoWriteTool::new(store.clone())))?;
    registry.register(Arc::new(TodoReadTool::new(store)))?;
    Ok(())
}
