// ABOUTME: Defines ExecResult - the outcome of running a command on the host
// ABOUTME: or inside a sandbox.

use serde::{Deserialize, Serialize};

/// Result of executing a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Whether the command exited with status 0.
    pub success: bool,

    /// Exit code, or -1 when the process was terminated by a signal.
    pub returncode: i32,

    pub stdout: String,

    pub stderr: String,

    /// True when an output limit stopped reading one of the streams.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ExecResult {
    /// stdout followed by stderr, separated by a newline when both are present.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}
