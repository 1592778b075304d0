use crate::todo::{TodoItem, TodoStatus, TodoStore};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use weft_agent::Tool;
use weft_core::{ToolSchema, WeftError, WeftResult};

#[derive(Deserialize)]
struct WriteArgs {
    todos: Vec<TodoItem>,
    #[serde(default)]
    merge: bool,
}

/// Tool that writes the shared todo plan, either merging by id or replacing
/// the list wholesale.
pub struct TodoWriteTool {
    store: Arc<TodoStore>,
    schema: ToolSchema,
}

impl TodoWriteTool {
    pub fn new(store: Arc<TodoStore>) -> Self {
        Self {
            store,
            schema: ToolSchema {
                name: "todo_write".to_string(),
                description: "Create or update the task plan. With merge=true, items are \
                              matched by id and updated in place; otherwise the whole list \
                              is replaced."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "todos": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "id": {"type": "string"},
                                    "content": {"type": "string"},
                                    "status": {
                                        "type": "string",
                                        "enum": ["pending", "in_progress", "completed", "cancelled"]
                                    },
                                    "priority": {
                                        "type": "string",
                                        "enum": ["high", "medium", "low"]
                                    }
                                },
                                "required": ["id", "content", "status", "priority"]
                            }
                        },
                        "merge": {
                            "type": "boolean",
                            "description": "Update existing items by id instead of replacing the list"
                        }
                    },
                    "required": ["todos"]
                }),
            },
        }
    }
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, arguments: &str) -> WeftResult<String> {
        let args: WriteArgs = serde_json::from_str(arguments)
            .map_err(|e| WeftError::Tool(format!("invalid todo_write arguments: {e}")))?;
        let plan = self.store.apply(args.todos, args.merge).await?;

        let done = plan
            .todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count();
        info!(todos = plan.todos.len(), done, merge = args.merge, "todo plan updated");
        Ok(format!(
            "plan updated: {} todos, {} completed",
            plan.todos.len(),
            done
        ))
    }
}
