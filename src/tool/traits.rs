// ABOUTME: Defines the Tool trait - something a model can call with JSON
// ABOUTME: arguments, described by a name, description and parameter schema.

use async_trait::async_trait;

use super::{ToolInfo, ToolResult};
use crate::schema::ToolParams;

/// A tool that can be called by a model.
///
/// Errors returned from `execute` are classified by the dispatcher: a
/// [`ToolCallError`](crate::error::ToolCallError), a reportable
/// [`SandboxError`](crate::error::SandboxError) or a subprocess timeout is
/// sent back to the model; anything else aborts the sample.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a human-readable description for the model.
    fn description(&self) -> &str;

    /// Returns the schema for the tool's input parameters.
    fn parameters(&self) -> ToolParams;

    /// Execute the tool with the given arguments.
    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error>;

    /// The description of this tool as presented to a model.
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}
