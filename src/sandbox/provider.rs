// ABOUTME: Sandbox providers - lifecycle hooks for creating and cleaning up
// ABOUTME: environments, a registry of providers, and task/sample orchestration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LocalSandboxProvider, SandboxEnvironmentSpec, SandboxEnvironments};
use crate::concurrency::concurrency;
use crate::error::{EvalError, SandboxError};
use crate::sample::SampleContext;

/// Creates and tears down sandbox environments of one type.
///
/// Hooks run in this order: `task_init` once per task, then `sample_init` /
/// `sample_cleanup` around every sample, then `task_cleanup`. `cli_cleanup`
/// is invoked out of band from the command line to remove leftovers.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Type name used in sandbox specs.
    fn kind(&self) -> &str;

    /// Maximum number of samples that may hold environments at once, if the
    /// backend needs a cap.
    fn default_concurrency(&self) -> Option<usize> {
        None
    }

    /// Called once before any sample of a task.
    async fn task_init(&self, _task_name: &str, _config: Option<&str>) -> Result<(), SandboxError> {
        Ok(())
    }

    /// Create the environments for one sample.
    async fn sample_init(
        &self,
        task_name: &str,
        config: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> Result<SandboxEnvironments, SandboxError>;

    /// Release one sample's environments. `interrupted` is set when the
    /// sample did not run to completion.
    async fn sample_cleanup(
        &self,
        task_name: &str,
        config: Option<&str>,
        environments: &SandboxEnvironments,
        interrupted: bool,
    ) -> Result<(), SandboxError>;

    /// Called once after every sample of a task. `cleanup` is false when the
    /// user asked to keep environments around.
    async fn task_cleanup(
        &self,
        _task_name: &str,
        _config: Option<&str>,
        _cleanup: bool,
    ) -> Result<(), SandboxError> {
        Ok(())
    }

    /// Remove environments left behind by earlier runs; `None` removes all.
    async fn cli_cleanup(&self, _id: Option<&str>) -> Result<(), SandboxError> {
        Ok(())
    }
}

/// A thread-safe registry of sandbox providers keyed by type name.
#[derive(Default)]
pub struct SandboxProviderRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn SandboxProvider>>>>,
}

impl SandboxProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry containing the built-in providers.
    pub async fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(LocalSandboxProvider).await;
        registry
    }

    /// Register a provider, replacing any with the same type name.
    pub async fn register<P: SandboxProvider + 'static>(&self, provider: P) {
        self.register_arc(Arc::new(provider)).await;
    }

    pub async fn register_arc(&self, provider: Arc<dyn SandboxProvider>) {
        let mut providers = self.providers.write().await;
        providers.insert(provider.kind().to_string(), provider);
    }

    pub async fn get(&self, kind: &str) -> Result<Arc<dyn SandboxProvider>, SandboxError> {
        let providers = self.providers.read().await;
        providers
            .get(kind)
            .cloned()
            .ok_or_else(|| SandboxError::UnknownProvider(kind.to_string()))
    }

    /// Registered type names, sorted alphabetically.
    pub async fn list(&self) -> Vec<String> {
        let providers = self.providers.read().await;
        let mut kinds: Vec<_> = providers.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl Clone for SandboxProviderRegistry {
    fn clone(&self) -> Self {
        Self {
            providers: Arc::clone(&self.providers),
        }
    }
}

/// The sandbox side of a running task: resolves the provider, runs the task
/// hooks, and wraps each sample in init/cleanup.
pub struct SandboxTask {
    task_name: String,
    spec: SandboxEnvironmentSpec,
    provider: Arc<dyn SandboxProvider>,
    cleanup: bool,
    max_samples: Option<usize>,
}

impl SandboxTask {
    /// Resolve the provider for `spec` and run its `task_init` hook.
    pub async fn init(
        registry: &SandboxProviderRegistry,
        task_name: &str,
        spec: SandboxEnvironmentSpec,
    ) -> Result<Self, SandboxError> {
        let provider = registry.get(&spec.kind).await?;
        tracing::info!(task = task_name, sandbox = %spec, "initializing sandbox");
        provider.task_init(task_name, spec.config.as_deref()).await?;
        let max_samples = provider.default_concurrency();
        Ok(Self {
            task_name: task_name.to_string(),
            spec,
            provider,
            cleanup: true,
            max_samples,
        })
    }

    /// Keep environments after the task when `cleanup` is false.
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Cap the number of samples holding environments at once. Overrides
    /// the provider's default.
    pub fn max_samples(mut self, max: Option<usize>) -> Self {
        if max.is_some() {
            self.max_samples = max;
        }
        self
    }

    pub fn spec(&self) -> &SandboxEnvironmentSpec {
        &self.spec
    }

    /// Run one sample with freshly initialized environments installed in its
    /// [`SampleContext`]. Environments are cleaned up afterwards; cleanup
    /// failures are logged rather than replacing the sample's output.
    pub async fn run_sample<F: Future>(
        &self,
        context: SampleContext,
        metadata: &HashMap<String, String>,
        fut: F,
    ) -> Result<F::Output, EvalError> {
        let _permit = match self.max_samples {
            Some(limit) => {
                let name = format!("sandbox/{}", self.spec.kind);
                Some(concurrency(&name, limit, None).await?)
            }
            None => None,
        };

        let config = self.spec.config.as_deref();
        let environments = self
            .provider
            .sample_init(&self.task_name, config, metadata)
            .await?;
        tracing::debug!(sample = context.id(), environments = ?environments, "sample sandboxes ready");

        let mut guard = SampleCleanupGuard {
            provider: Arc::clone(&self.provider),
            task_name: self.task_name.clone(),
            config: self.spec.config.clone(),
            environments: self.cleanup.then(|| environments.clone()),
        };

        let output = context.with_sandboxes(environments).run(fut).await;

        if let Some(environments) = guard.disarm() {
            if let Err(e) = self
                .provider
                .sample_cleanup(&self.task_name, config, &environments, false)
                .await
            {
                tracing::warn!(task = %self.task_name, "sample cleanup failed: {}", e);
            }
        }
        Ok(output)
    }

    /// Run the provider's `task_cleanup` hook.
    pub async fn finish(self) -> Result<(), SandboxError> {
        self.provider
            .task_cleanup(&self.task_name, self.spec.config.as_deref(), self.cleanup)
            .await
    }
}

/// Runs `sample_cleanup` with `interrupted = true` when a sample is dropped
/// before it finishes. The hook is spawned onto the current runtime since
/// `Drop` cannot await.
struct SampleCleanupGuard {
    provider: Arc<dyn SandboxProvider>,
    task_name: String,
    config: Option<String>,
    environments: Option<SandboxEnvironments>,
}

impl SampleCleanupGuard {
    fn disarm(&mut self) -> Option<SandboxEnvironments> {
        self.environments.take()
    }
}

impl Drop for SampleCleanupGuard {
    fn drop(&mut self) {
        let Some(environments) = self.environments.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(task = %self.task_name, "no runtime to clean up interrupted sample");
            return;
        };
        tracing::debug!(task = %self.task_name, "sample interrupted, cleaning up sandboxes");
        let provider = Arc::clone(&self.provider);
        let task_name = std::mem::take(&mut self.task_name);
        let config = self.config.take();
        handle.spawn(async move {
            if let Err(e) = provider
                .sample_cleanup(&task_name, config.as_deref(), &environments, true)
                .await
            {
                tracing::warn!(task = %task_name, "interrupted sample cleanup failed: {}", e);
            }
        });
    }
}

/// Run a provider's `cli_cleanup` hook by type name.
pub async fn cli_cleanup(
    registry: &SandboxProviderRegistry,
    kind: &str,
    id: Option<&str>,
) -> Result<(), SandboxError> {
    let provider = registry.get(kind).await?;
    provider.cli_cleanup(id).await
}
