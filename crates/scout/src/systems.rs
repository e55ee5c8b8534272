use async_trait::async_trait;

use crate::errors::AgentResult;
use crate::models::tool::{Tool, ToolCall};

/// Core trait that defines a system that can be operated by an AI agent
///
/// A system contributes one or more tools. The agent routes a tool call to
/// the system whose `tools()` contains the requested name.
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system
    fn name(&self) -> &str;

    /// Get the system description
    fn description(&self) -> &str;

    /// Get system instructions, rendered into the system prompt
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// A short line telling the user what a call is about to do, shown ahead
    /// of the final answer. `None` keeps the call out of the activity trace.
    fn activity(&self, _tool_call: &ToolCall) -> Option<String> {
        None
    }

    /// Call a tool with the given arguments, returning the text handed back to the model
    async fn call(&self, tool_call: ToolCall) -> AgentResult<String>;
}
