use async_trait::async_trait;
use weft_core::{ToolSchema, WeftResult};

/// A callable tool exposed to the model.
///
/// Implementations receive the raw JSON argument string from the model and
/// return text that is fed back as the tool result. Argument parsing errors
/// should come back as `Err`; the agent loop reports them to the model as
/// error results rather than aborting the conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The schema advertised to the model.
    fn schema(&self) -> &ToolSchema;

    /// Executes the tool with the model-provided JSON arguments.
    async fn call(&self, arguments: &str) -> WeftResult<String>;
}
