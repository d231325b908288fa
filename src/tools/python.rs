// ABOUTME: PythonTool - runs python code in the sample's sandbox by piping
// ABOUTME: it to the interpreter's stdin.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::BashTool;
use crate::sample::sandbox;
use crate::schema::{ToolParam, ToolParams};
use crate::tool::{Tool, ToolResult};

/// Tool for executing python code. Output must be produced with `print()`.
#[derive(Debug, Clone)]
pub struct PythonTool {
    interpreter: String,
    timeout: Option<Duration>,
    user: Option<String>,
    sandbox: Option<String>,
}

impl Default for PythonTool {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: None,
            user: None,
            sandbox: None,
        }
    }
}

impl PythonTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpreter executable, `python3` by default.
    pub fn interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn sandbox(mut self, name: impl Into<String>) -> Self {
        self.sandbox = Some(name.into());
        self
    }
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "python"
    }

    fn description(&self) -> &str {
        "Use the python function to execute Python code. The Python tool executes \
         single-run Python scripts. Each execution is independent, so use print() \
         to see the output of any value."
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new().required(
            "code",
            ToolParam::string().describe("The python code to execute."),
        )
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        #[derive(Deserialize)]
        struct Params {
            code: String,
        }
        let params: Params = serde_json::from_value(params)?;

        let options =
            BashTool::options(self.timeout, self.user.as_deref()).input(params.code.into_bytes());
        let result = sandbox(self.sandbox.as_deref())?
            .exec(&[self.interpreter.as_str(), "-"], options)
            .await?;
        Ok(ToolResult::from_exec(&result))
    }
}
