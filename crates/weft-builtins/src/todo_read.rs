use crate::todo::{TodoPriority, TodoStatus, TodoStore};
use async_trait::async_trait;
use std::sync::Arc;
use weft_agent::Tool;
use weft_core::{ToolSchema, WeftResult};

fn status_mark(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Pending => "[ ]",
        TodoStatus::InProgress => "[~]",
        TodoStatus::Completed => "[x]",
        TodoStatus::Cancelled => "[-]",
    }
}

fn priority_tag(priority: TodoPriority) -> &'static str {
    match priority {
        TodoPriority::High => "high",
        TodoPriority::Medium => "medium",
        TodoPriority::Low => "low",
    }
}

/// Tool that renders the current todo plan as a checklist.
pub struct TodoReadTool {
    store: Arc<TodoStore>,
    schema: ToolSchema,
}

impl TodoReadTool {
    pub fn new(store: Arc<TodoStore>) -> Self {
        Self {
            store,
            schema: ToolSchema {
                name: "todo_read".to_string(),
                description: "Read the current task plan as a checklist.".to_string(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            },
        }
    }
}

#[async_trait]
impl Tool for TodoReadTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, _arguments: &str) -> WeftResult<String> {
        let plan = self.store.read().await?;
        if plan.todos.is_empty() {
            return Ok("(the todo list is empty)".to_string());
        }
        let lines: Vec<String> = plan
            .todos
            .iter()
            .map(|t| {
                format!(
                    "{} {} ({}, {})",
                    status_mark(t.status),
                    t.content,
                    t.id,
                    priority_tag(t.priority)
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
