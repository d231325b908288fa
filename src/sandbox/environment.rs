// ABOUTME: Defines the SandboxEnvironment trait and its option/connection types.
// ABOUTME: Backends implement exec, read_file, write_file and connection.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::subprocess::ExecResult;

/// Options for [`SandboxEnvironment::exec`].
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Data written to the command's stdin.
    pub input: Option<Vec<u8>>,
    /// Working directory, relative to the environment's root when not absolute.
    pub cwd: Option<String>,
    /// Extra environment variables.
    pub env: HashMap<String, String>,
    /// User to run as, for backends that support it.
    pub user: Option<String>,
    pub timeout: Option<Duration>,
    /// Retry with shorter timeouts when the command times out.
    pub timeout_retry: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            input: None,
            cwd: None,
            env: HashMap::new(),
            user: None,
            timeout: None,
            timeout_retry: true,
        }
    }
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_retry(mut self, retry: bool) -> Self {
        self.timeout_retry = retry;
        self
    }
}

/// How a person could attach to a sandbox environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConnection {
    /// Backend type, e.g. `local`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Shell command that opens a session in the environment.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// An execution and filesystem context for running untrusted commands.
///
/// Implementations do not need to enforce output size limits or timeout
/// retries; [`SandboxEnvironmentProxy`](super::SandboxEnvironmentProxy) does
/// that for every backend.
#[async_trait]
pub trait SandboxEnvironment: Send + Sync {
    /// Backend type name, e.g. `local`.
    fn kind(&self) -> &str;

    /// Execute a command. A timeout surfaces as [`SandboxError::Timeout`].
    async fn exec(&self, cmd: &[String], options: &ExecOptions) -> Result<ExecResult, SandboxError>;

    /// Read a file. Relative paths resolve against the environment's
    /// working directory.
    async fn read_file(&self, file: &str) -> Result<Vec<u8>, SandboxError>;

    /// Write a file, creating parent directories as needed.
    async fn write_file(&self, file: &str, contents: &[u8]) -> Result<(), SandboxError>;

    /// Connection details for attaching to the environment.
    async fn connection(&self) -> Result<SandboxConnection, SandboxError> {
        Err(SandboxError::ConnectionUnsupported(self.kind().to_string()))
    }
}

/// A sandbox type plus optional backend configuration, written as
/// `type` or `type:config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEnvironmentSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl SandboxEnvironmentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            config: None,
        }
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }
}

impl FromStr for SandboxEnvironmentSpec {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, config) = match s.split_once(':') {
            Some((kind, config)) => (kind.trim(), Some(config.trim())),
            None => (s.trim(), None),
        };
        if kind.is_empty() {
            return Err(SandboxError::InvalidSpec(s.to_string()));
        }
        Ok(Self {
            kind: kind.to_string(),
            config: config.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }
}

impl std::fmt::Display for SandboxEnvironmentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.config {
            Some(config) => write!(f, "{}:{}", self.kind, config),
            None => f.write_str(&self.kind),
        }
    }
}
