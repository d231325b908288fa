// ABOUTME: BashTool - runs a shell command in the sample's sandbox.
// ABOUTME: Non-zero exits are reported to the model with stderr.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::sample::sandbox;
use crate::sandbox::ExecOptions;
use crate::schema::{ToolParam, ToolParams};
use crate::tool::{Tool, ToolResult};

/// Tool for executing shell commands with `bash -c`.
#[derive(Debug, Clone, Default)]
pub struct BashTool {
    timeout: Option<Duration>,
    user: Option<String>,
    sandbox: Option<String>,
}

impl BashTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Run in the named sandbox instead of the default one.
    pub fn sandbox(mut self, name: impl Into<String>) -> Self {
        self.sandbox = Some(name.into());
        self
    }

    pub(crate) fn options(timeout: Option<Duration>, user: Option<&str>) -> ExecOptions {
        let mut options = ExecOptions::new();
        if let Some(timeout) = timeout {
            options = options.timeout(timeout);
        }
        if let Some(user) = user {
            options = options.user(user);
        }
        options
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Use this function to execute bash commands."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new().required(
            "cmd",
            ToolParam::string().describe("The bash command to execute."),
        )
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            cmd: String,
        }
        let params: Params = serde_json::from_value(params)?;

        let options = Self::options(self.timeout, self.user.as_deref());
        let result = sandbox(self.sandbox.as_deref())?
            .exec(&["bash", "-c", params.cmd.as_str()], options)
            .await?;
        Ok(ToolResult::from_exec(&result))
    }
}
