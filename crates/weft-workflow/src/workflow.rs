use crate::graph::TaskGraph;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use weft_agent::Agent;
use weft_core::{WeftError, WeftResult};
use weft_session::Conversation;

/// What a task receives when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskInput {
    /// A root task gets the workflow's original input.
    Original(String),
    /// A single-parent task gets its parent's output.
    Single(String),
    /// A multi-parent task gets all parent outputs, in the order the
    /// parents were declared on the task.
    Many(Vec<String>),
}

impl TaskInput {
    /// Flattens the input into one prompt string.
    pub fn joined(&self) -> String {
        match self {
            TaskInput::Original(text) | TaskInput::Single(text) => text.clone(),
            TaskInput::Many(texts) => texts.join("\n\n"),
        }
    }
}

/// One runnable unit of work in a workflow.
#[async_trait]
pub trait TaskAgent: Send {
    async fn run(&mut self, input: TaskInput) -> WeftResult<String>;
}

/// Builds the agent for a named task. A fresh agent per task run keeps
/// task histories isolated.
pub trait AgentBuilder: Send + Sync {
    fn build(&self, task_name: &str) -> WeftResult<Box<dyn TaskAgent>>;
}

/// [`TaskAgent`] backed by the tool-calling agent loop; every run starts a
/// fresh conversation.
pub struct AgentTask {
    agent: Agent,
}

impl AgentTask {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl TaskAgent for AgentTask {
    async fn run(&mut self, input: TaskInput) -> WeftResult<String> {
        let mut conversation = Conversation::new();
        self.agent.run(&mut conversation, &input.joined()).await
    }
}

/// Runs a validated task graph: tasks execute sequentially in the frozen
/// topological order, each fed from its parents' outputs. The graph is
/// reusable; every run gets fresh agents and a fresh output map.
pub struct Workflow {
    graph: TaskGraph,
    builder: Arc<dyn AgentBuilder>,
}

impl Workflow {
    pub fn new(graph: TaskGraph, builder: Arc<dyn AgentBuilder>) -> Self {
        Self { graph, builder }
    }

    /// Executes the workflow for one input. Any task error aborts the run;
    /// there are no partial results. The returned map holds terminal task
    /// outputs only.
    pub async fn run(&self, input: &str) -> WeftResult<HashMap<String, String>> {
        let mut outputs: HashMap<String, String> = HashMap::new();
        info!(tasks = self.graph.task_count(), "starting workflow");

        for decl in self.graph.execution_order() {
            let task_input = match decl.parents.as_slice() {
                [] => TaskInput::Original(input.to_string()),
                [parent] => TaskInput::Single(Self::parent_output(&outputs, parent, &decl.name)?),
                parents => TaskInput::Many(
                    parents
                        .iter()
                        .map(|p| Self::parent_output(&outputs, p, &decl.name))
                        .collect::<WeftResult<_>>()?,
                ),
            };

            info!(task = %decl.name, parents = decl.parents.len(), "running task");
            let mut agent = self.builder.build(&decl.name)?;
            let output = match agent.run(task_input).await {
                Ok(output) => output,
                Err(e) => {
                    error!(task = %decl.name, error = %e, "task failed, aborting workflow");
                    return Err(e);
                }
            };
            outputs.insert(decl.name.clone(), output);
        }

        let mut result = HashMap::new();
        for terminal in self.graph.terminals() {
            if let Some(output) = outputs.remove(terminal) {
                result.insert(terminal.clone(), output);
            }
        }
        info!(terminals = result.len(), "workflow completed");
        Ok(result)
    }

    fn parent_output(
        outputs: &HashMap<String, String>,
        parent: &str,
        task: &str,
    ) -> WeftResult<String> {
        outputs.get(parent).cloned().ok_or_else(|| {
            WeftError::Workflow(format!(
                "task '{task}' scheduled before parent '{parent}' completed"
            ))
        })
    }
}
