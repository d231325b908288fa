// ABOUTME: Built-in tools that act on the current sample's sandbox: shell and
// ABOUTME: python execution plus file reads and writes.

mod bash;
mod python;
mod read_file;
mod write_file;

pub use bash::BashTool;
pub use python::PythonTool;
pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

use crate::error::ToolError;
use crate::tool::Registry;

/// Register every built-in tool with default settings.
pub async fn register_builtins(registry: &Registry) -> Result<(), ToolError> {
    registry.register(BashTool::new()).await?;
    registry.register(PythonTool::new()).await?;
    registry.register(ReadFileTool::new()).await?;
    registry.register(WriteFileTool::new()).await?;
    Ok(())
}
