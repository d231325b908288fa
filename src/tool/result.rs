// ABOUTME: Defines ToolResult - what a tool hands back to the dispatcher:
// ABOUTME: content for the model, an error flag and free-form metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::subprocess::ExecResult;

/// Result of a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content.
    pub content: String,

    /// Set when the tool ran but failed; the content is sent to the model as
    /// an error message.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ToolResult {
    /// Create a successful text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
            ..Self::default()
        }
    }

    /// Output of a command run: stdout (preceded by stderr, if any) on success,
    /// otherwise an error carrying stderr, or the exit code if stderr is
    /// empty.
    pub fn from_exec(result: &ExecResult) -> Self {
        if result.success {
            let output = if result.stderr.is_empty() {
                result.stdout.clone()
            } else {
                format!("{}\n{}", result.stderr, result.stdout)
            };
            return Self::text(output).with_metadata("returncode", result.returncode);
        }
        let message = if result.stderr.is_empty() {
            format!("Command failed with exit code {}", result.returncode)
        } else {
            result.stderr.clone()
        };
        Self::error(message).with_metadata("returncode", result.returncode)
    }

    /// Add metadata to the result.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), v);
        }
        self
    }
}
