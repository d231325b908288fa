// ABOUTME: Local sandbox backend - runs commands on the host inside a
// ABOUTME: per-sample temporary directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use super::{
    ExecOptions, MAX_EXEC_OUTPUT_SIZE, MAX_READ_FILE_SIZE, SandboxConnection, SandboxEnvironment,
    SandboxEnvironments, SandboxProvider,
};
use crate::error::{ExecError, SandboxError};
use crate::subprocess::{ExecResult, Subprocess};

/// Type name of the local backend.
pub const LOCAL_SANDBOX: &str = "local";

/// A sandbox environment on the host, rooted at a temporary directory that
/// is removed when the environment is dropped.
///
/// This offers no isolation; it is meant for development and for tasks
/// whose commands are trusted.
pub struct LocalSandboxEnvironment {
    dir: TempDir,
}

impl LocalSandboxEnvironment {
    /// Create an environment in a new temporary directory.
    pub fn new() -> Result<Self, SandboxError> {
        let dir = tempfile::Builder::new().prefix("evalkit-local-").tempdir()?;
        tracing::debug!(dir = %dir.path().display(), "created local sandbox");
        Ok(Self { dir })
    }

    /// Root directory of the environment.
    pub fn directory(&self) -> &Path {
        self.dir.path()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.path().join(path)
        }
    }
}

#[async_trait]
impl SandboxEnvironment for LocalSandboxEnvironment {
    fn kind(&self) -> &str {
        LOCAL_SANDBOX
    }

    async fn exec(&self, cmd: &[String], options: &ExecOptions) -> Result<ExecResult, SandboxError> {
        if options.user.is_some() {
            tracing::warn!("the local sandbox ignores the 'user' exec option");
        }
        let cwd = match &options.cwd {
            Some(cwd) => self.resolve(cwd),
            None => self.dir.path().to_path_buf(),
        };

        let mut subprocess = Subprocess::new(cmd.iter().cloned())
            .cwd(cwd)
            .env(options.env.clone())
            .output_limit(MAX_EXEC_OUTPUT_SIZE)
            .maybe_timeout(options.timeout);
        if let Some(input) = &options.input {
            subprocess = subprocess.input(input.clone());
        }

        subprocess.run().await.map_err(|e| match e {
            ExecError::Timeout(after) => SandboxError::Timeout(after),
            other => SandboxError::Exec(other),
        })
    }

    async fn read_file(&self, file: &str) -> Result<Vec<u8>, SandboxError> {
        let path = self.resolve(file);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| SandboxError::from_io(file, e))?;
        if metadata.is_dir() {
            return Err(SandboxError::IsADirectory(file.to_string()));
        }
        if metadata.len() > MAX_READ_FILE_SIZE as u64 {
            return Err(SandboxError::OutputLimitExceeded {
                limit: MAX_READ_FILE_SIZE,
                truncated_output: None,
            });
        }
        tokio::fs::read(&path)
            .await
            .map_err(|e| SandboxError::from_io(file, e))
    }

    async fn write_file(&self, file: &str, contents: &[u8]) -> Result<(), SandboxError> {
        let path = self.resolve(file);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SandboxError::from_io(file, e))?;
            }
        }
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(SandboxError::IsADirectory(file.to_string()));
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| SandboxError::from_io(file, e))
    }

    async fn connection(&self) -> Result<SandboxConnection, SandboxError> {
        let dir = self.dir.path().display().to_string();
        Ok(SandboxConnection {
            kind: LOCAL_SANDBOX.to_string(),
            command: format!("cd {}", dir),
            working_dir: Some(dir),
            ports: Vec::new(),
            container: None,
        })
    }
}

/// Provider for [`LocalSandboxEnvironment`]s. Each sample gets one
/// environment named `default`.
#[derive(Debug, Default)]
pub struct LocalSandboxProvider;

#[async_trait]
impl SandboxProvider for LocalSandboxProvider {
    fn kind(&self) -> &str {
        LOCAL_SANDBOX
    }

    async fn sample_init(
        &self,
        task_name: &str,
        _config: Option<&str>,
        _metadata: &HashMap<String, String>,
    ) -> Result<SandboxEnvironments, SandboxError> {
        let environment = LocalSandboxEnvironment::new()?;
        tracing::debug!(task = task_name, dir = %environment.directory().display(), "local sample init");
        Ok(SandboxEnvironments::single(Arc::new(environment)))
    }

    async fn sample_cleanup(
        &self,
        task_name: &str,
        _config: Option<&str>,
        environments: &SandboxEnvironments,
        interrupted: bool,
    ) -> Result<(), SandboxError> {
        // Directories are removed when the last handle to each environment drops.
        tracing::debug!(
            task = task_name,
            environments = environments.len(),
            interrupted,
            "local sample cleanup"
        );
        Ok(())
    }

    async fn cli_cleanup(&self, id: Option<&str>) -> Result<(), SandboxError> {
        tracing::info!(
            id = id.unwrap_or("<all>"),
            "local sandboxes are removed with their samples; nothing to clean up"
        );
        Ok(())
    }
}
