// ABOUTME: ReadFileTool - reads a text file from the sample's sandbox.
// ABOUTME: Missing files, directories and binary content are reported to the model.

use async_trait::async_trait;
use serde::Deserialize;

use crate::sample::sandbox;
use crate::schema::{ToolParam, ToolParams};
use crate::tool::{Tool, ToolResult};

/// Tool for reading file contents.
#[derive(Debug, Clone, Default)]
pub struct ReadFileTool {
    sandbox: Option<String>,
}

impl ReadFileTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sandbox(mut self, name: impl Into<String>) -> Self {
        self.sandbox = Some(name.into());
        self
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Returns the file contents as text."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new().required(
            "path",
            ToolParam::string().describe("The path to the file to read"),
        )
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            path: String,
        }
        let params: Params = serde_json::from_value(params)?;

        let contents = sandbox(self.sandbox.as_deref())?
            .read_file_text(&params.path)
            .await?;
        Ok(ToolResult::text(contents).with_metadata("path", &params.path))
    }
}
