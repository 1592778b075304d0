use crate::registry::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use weft_core::{Message, ToolCall, WeftError, WeftResult};
use weft_llm::ChatModel;
use weft_session::Conversation;

/// Hook invoked on the message history before each model call, used to
/// plug in history compaction without coupling the loop to it.
#[async_trait]
pub trait MemoryHook: Send + Sync {
    async fn refresh(&self, messages: &mut Vec<Message>) -> WeftResult<()>;
}

/// Phase of the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The next step is a model call.
    AwaitingModel,
    /// The model requested tools that have not been executed yet.
    AwaitingTools,
    /// The model produced a terminal answer.
    Done,
    /// The loop gave up (round budget exhausted).
    Failed,
}

impl LoopState {
    /// The transition taken after a model reply: tool calls mean another
    /// round, anything else is terminal.
    pub fn after_reply(reply: &Message) -> Self {
        if reply.has_tool_calls() {
            LoopState::AwaitingTools
        } else {
            LoopState::Done
        }
    }
}

/// Configures one agent's behaviour.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System prompt seeded as the first message of a fresh conversation.
    pub system_prompt: String,
    /// Upper bound on model rounds per `run` call; exceeding it is an error.
    pub max_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant. Use the available tools when they \
                            help you answer."
                .to_string(),
            max_rounds: 20,
        }
    }
}

/// The agent loop: prompt, model, tool calls, results, repeat until the
/// model answers without requesting tools.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    memory: Option<Arc<dyn MemoryHook>>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            model,
            tools,
            memory: None,
            config,
        }
    }

    /// Attaches a memory hook that runs before every model call.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryHook>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Runs the loop for one user input. Returns the final assistant text.
    ///
    /// Every tool call in an assistant message is executed in the order the
    /// model issued it, and each result is appended as a tool message
    /// carrying the originating call id, so the history the model sees next
    /// round pairs calls with results exactly.
    pub async fn run(&self, conversation: &mut Conversation, input: &str) -> WeftResult<String> {
        if conversation.messages.is_empty() && !self.config.system_prompt.is_empty() {
            conversation.push(Message::system(&self.config.system_prompt));
        }
        conversation.push(Message::user(input));

        let schemas = self.tools.schemas();
        info!(conversation = %conversation.id, tools = schemas.len(), "starting agent loop");

        let mut state = LoopState::AwaitingModel;
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut final_text = String::new();
        let mut rounds = 0u32;

        while state != LoopState::Done && state != LoopState::Failed {
            match state {
                LoopState::AwaitingModel => {
                    if rounds >= self.config.max_rounds {
                        warn!(rounds, "round budget exhausted");
                        state = LoopState::Failed;
                        continue;
                    }
                    rounds += 1;

                    if let Some(memory) = &self.memory {
                        memory.refresh(&mut conversation.messages).await?;
                    }

                    let reply = self
                        .model
                        .complete(&conversation.messages, &schemas)
                        .await?;
                    state = LoopState::after_reply(&reply);
                    if let Some(calls) = &reply.tool_calls {
                        pending = calls.clone();
                    }
                    final_text.clone_from(&reply.content);
                    conversation.push(reply);
                }
                LoopState::AwaitingTools => {
                    for call in pending.drain(..) {
                        info!(tool = %call.tool_name, call_id = %call.id, "executing tool call");
                        let result = self.tools.execute(&call).await;
                        if result.is_error {
                            warn!(tool = %call.tool_name, "tool returned an error result");
                        }
                        conversation.push(Message::tool(
                            &result.content,
                            &result.call_id,
                            &call.tool_name,
                        ));
                    }
                    state = LoopState::AwaitingModel;
                }
                LoopState::Done | LoopState::Failed => {}
            }
        }

        if state == LoopState::Failed {
            return Err(WeftError::Agent(format!(
                "agent exceeded {} rounds without a final answer",
                self.config.max_rounds
            )));
        }
        info!(conversation = %conversation.id, rounds, "agent loop completed");
        Ok(final_text)
    }
}
