use crate::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use weft_core::{ToolCall, ToolResult, ToolSchema, WeftError, WeftResult};

/// Central registry for the tools an agent may call.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    // Registration order, so advertised schemas are deterministic.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registers a tool under its schema name. Duplicate names are rejected
    /// rather than silently replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> WeftResult<()> {
        let name = tool.schema().name.clone();
        if self.tools.contains_key(&name) {
            return Err(WeftError::Agent(format!(
                "tool '{name}' is already registered"
            )));
        }
        info!(tool = %name, "registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Schemas for every registered tool, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.schema().clone())
            .collect()
    }

    /// Executes one tool call. Unknown tools and handler failures come back
    /// as error results so the model can observe and recover from them.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.tool_name) else {
            warn!(tool = %call.tool_name, "model requested unknown tool");
            return ToolResult::error(
                &call.id,
                format!("unknown tool: {}", call.tool_name),
            );
        };
        match tool.call(&call.arguments).await {
            Ok(output) => ToolResult::success(&call.id, output),
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "tool execution failed");
                ToolResult::error(&call.id, format!("tool '{}' failed: {e}", call.tool_name))
            }
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
