// ABOUTME: WriteFileTool - writes text to a file in the sample's sandbox,
// ABOUTME: creating parent directories and overwriting existing files.

use async_trait::async_trait;
use serde::Deserialize;

use crate::sample::sandbox;
use crate::schema::{ToolParam, ToolParams};
use crate::tool::{Tool, ToolResult};

/// Tool for writing content to files.
#[derive(Debug, Clone, Default)]
pub struct WriteFileTool {
    sandbox: Option<String>,
}

impl WriteFileTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sandbox(mut self, name: impl Into<String>) -> Self {
        self.sandbox = Some(name.into());
        self
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites if it does."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new()
            .required(
                "path",
                ToolParam::string().describe("The path to the file to write"),
            )
            .required(
                "content",
                ToolParam::string().describe("The content to write to the file"),
            )
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            path: String,
            content: String,
        }
        let params: Params = serde_json::from_value(params)?;

        sandbox(self.sandbox.as_deref())?
            .write_file_text(&params.path, &params.content)
            .await?;
        Ok(ToolResult::text(format!(
            "Successfully wrote {} bytes to {}",
            params.content.len(),
            params.path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleContext;
    use crate::sandbox::{LocalSandboxEnvironment, SandboxEnvironment, SandboxEnvironments};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_write_creates_nested_file() {
        let local = Arc::new(LocalSandboxEnvironment::new().unwrap());
        let env: Arc<dyn SandboxEnvironment> = local.clone();
        let context = SampleContext::new("write").with_sandboxes(SandboxEnvironments::single(env));

        let result = context
            .run(WriteFileTool::new().execute(serde_json::json!({
                "path": "out/result.txt",
                "content": "42"
            })))
            .await
            .unwrap();

        assert_eq!(result.content, "Successfully wrote 2 bytes to out/result.txt");
        let written = std::fs::read_to_string(local.directory().join("out/result.txt")).unwrap();
        assert_eq!(written, "42");
    }
}
