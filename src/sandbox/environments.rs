// ABOUTME: SandboxEnvironments - the named environments of one sample.
// ABOUTME: Resolves the default environment and looks environments up by file.

use std::sync::Arc;

use super::{ExecOptions, SandboxEnvironment, SandboxEnvironmentProxy};
use crate::error::SandboxError;
use crate::transcript::Transcript;

/// Name given to the default environment by providers that create one.
pub const DEFAULT_SANDBOX_NAME: &str = "default";

/// Named sandbox environments for a sample.
///
/// The environment named `default` is the default; when there is none, the
/// first environment is. Cloning shares the environments.
#[derive(Clone, Default)]
pub struct SandboxEnvironments {
    environments: Vec<(String, Arc<dyn SandboxEnvironment>)>,
}

impl SandboxEnvironments {
    pub fn new(environments: Vec<(String, Arc<dyn SandboxEnvironment>)>) -> Self {
        let mut environments = environments;
        if let Some(pos) = environments
            .iter()
            .position(|(name, _)| name == DEFAULT_SANDBOX_NAME)
        {
            let default = environments.remove(pos);
            environments.insert(0, default);
        }
        Self { environments }
    }

    /// A single environment registered under `default`.
    pub fn single(environment: Arc<dyn SandboxEnvironment>) -> Self {
        Self::new(vec![(DEFAULT_SANDBOX_NAME.to_string(), environment)])
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    /// Environment names, default first.
    pub fn names(&self) -> Vec<&str> {
        self.environments.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn default_name(&self) -> Option<&str> {
        self.environments.first().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn SandboxEnvironment>)> {
        self.environments.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Look up an environment by name, or the default when `name` is `None`.
    pub fn get(&self, name: Option<&str>) -> Result<(&str, &Arc<dyn SandboxEnvironment>), SandboxError> {
        if self.environments.is_empty() {
            return Err(SandboxError::NoSandboxes);
        }
        let found = match name {
            None => self.environments.first(),
            Some(name) => self.environments.iter().find(|(n, _)| n == name),
        };
        found
            .map(|(n, e)| (n.as_str(), e))
            .ok_or_else(|| SandboxError::NotFound(name.unwrap_or_default().to_string()))
    }

    /// A proxy for the named (or default) environment that records its events
    /// into `transcript`.
    pub fn proxy(
        &self,
        name: Option<&str>,
        transcript: Transcript,
    ) -> Result<SandboxEnvironmentProxy, SandboxError> {
        let (name, environment) = self.get(name)?;
        Ok(SandboxEnvironmentProxy::new(
            name,
            Arc::clone(environment),
            transcript,
        ))
    }

    /// Name of the first environment in which `file` exists.
    pub async fn name_with_file(&self, file: &str) -> Result<String, SandboxError> {
        if self.environments.is_empty() {
            return Err(SandboxError::NoSandboxes);
        }
        let cmd = vec!["test".to_string(), "-e".to_string(), file.to_string()];
        let options = ExecOptions::new().timeout_retry(false);
        for (name, environment) in &self.environments {
            match environment.exec(&cmd, &options).await {
                Ok(result) if result.success => return Ok(name.clone()),
                Ok(_) => {}
                Err(e) => tracing::debug!(sandbox = %name, "file probe failed: {}", e),
            }
        }
        Err(SandboxError::NoSandboxWithFile(file.to_string()))
    }
}

impl std::fmt::Debug for SandboxEnvironments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
