// ABOUTME: Defines all error types for the evalkit library using thiserror.
// ABOUTME: Each submodule has its own error enum, unified under EvalError.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level error type for the evalkit library.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Concurrency error: {0}")]
    Concurrency(#[from] ConcurrencyError),

    #[error("Subprocess error: {0}")]
    Exec(#[from] ExecError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Limit error: {0}")]
    Limit(#[from] LimitError),

    #[error(transparent)]
    LimitExceeded(#[from] LimitExceededError),
}

/// Errors from typed store access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Value for key '{key}' has an unexpected shape: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model for namespace '{0}' must serialize to a JSON object")]
    NotAnObject(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from concurrency contexts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcurrencyError {
    #[error("Concurrency limit for '{0}' must be at least 1")]
    InvalidLimit(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("Concurrency gate '{0}' was closed")]
    Closed(String),
}

/// Errors from subprocess execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Command must not be empty")]
    EmptyCommand,

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
}

/// Errors from sandbox environments and their providers.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Output exceeded the {limit} byte limit")]
    OutputLimitExceeded {
        limit: usize,
        truncated_output: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("File '{0}' is not valid UTF-8")]
    UnicodeDecode(String),

    #[error("No sandbox environments are available in this context")]
    NoSandboxes,

    #[error("Sandbox environment '{0}' not found")]
    NotFound(String),

    #[error("No sandbox environment contains '{0}'")]
    NoSandboxWithFile(String),

    #[error("Unknown sandbox type '{0}'")]
    UnknownProvider(String),

    #[error("Sandbox '{0}' does not support connections")]
    ConnectionUnsupported(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Invalid sandbox spec: {0}")]
    InvalidSpec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl SandboxError {
    /// Map an IO error encountered while accessing `path` to the matching
    /// sandbox error.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            std::io::ErrorKind::IsADirectory => Self::IsADirectory(path.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Returns the tool-call error kind this error is reported as, or `None`
    /// if it should abort the run.
    pub fn reported_kind(&self) -> Option<ToolCallErrorKind> {
        match self {
            Self::Timeout(_) => Some(ToolCallErrorKind::Timeout),
            Self::OutputLimitExceeded { .. } => Some(ToolCallErrorKind::OutputLimit),
            Self::FileNotFound(_) => Some(ToolCallErrorKind::FileNotFound),
            Self::PermissionDenied(_) => Some(ToolCallErrorKind::Permission),
            Self::IsADirectory(_) => Some(ToolCallErrorKind::IsADirectory),
            Self::UnicodeDecode(_) => Some(ToolCallErrorKind::UnicodeDecode),
            Self::Exec(ExecError::Timeout(_)) => Some(ToolCallErrorKind::Timeout),
            _ => None,
        }
    }
}

/// Errors from tool definition and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool name '{0}': only letters, digits, '_' and '-' are allowed")]
    InvalidName(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Execution failed: {0}")]
    Execution(#[source] anyhow::Error),
}

/// Kind of error reported back to the model for a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallErrorKind {
    Parsing,
    Timeout,
    UnicodeDecode,
    Permission,
    FileNotFound,
    IsADirectory,
    Limit,
    OutputLimit,
    Approval,
    Unknown,
}

impl fmt::Display for ToolCallErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsing => "parsing",
            Self::Timeout => "timeout",
            Self::UnicodeDecode => "unicode_decode",
            Self::Permission => "permission",
            Self::FileNotFound => "file_not_found",
            Self::IsADirectory => "is_a_directory",
            Self::Limit => "limit",
            Self::OutputLimit => "output_limit",
            Self::Approval => "approval",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// An error raised by a tool that is reported to the model as data instead
/// of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ToolCallError {
    #[serde(rename = "type")]
    pub kind: ToolCallErrorKind,
    pub message: String,
}

impl ToolCallError {
    pub fn new(kind: ToolCallErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A generic error raised by tool code.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ToolCallErrorKind::Unknown, message)
    }
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors from constructing limits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LimitError {
    #[error("{kind} limit value must be a non-negative number or None: {value}")]
    InvalidValue { kind: LimitKind, value: f64 },
}

/// Type of limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Message,
    Time,
    Working,
    Token,
    Operator,
    Custom,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Message => "message",
            Self::Time => "time",
            Self::Working => "working",
            Self::Token => "token",
            Self::Operator => "operator",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// Raised when a limit is exceeded.
///
/// In some cases this is raised when `value >= limit` so that an operation
/// which is guaranteed to exceed the limit is not wastefully performed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LimitExceededError {
    pub kind: LimitKind,
    pub value: f64,
    pub limit: f64,
    pub message: String,
}

impl LimitExceededError {
    pub fn new(kind: LimitKind, value: f64, limit: f64, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("Exceeded {} limit: {}", kind, limit));
        Self {
            kind,
            value,
            limit,
            message,
        }
    }
}
