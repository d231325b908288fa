// ABOUTME: Tests for sandbox providers - registry, spec parsing, lifecycle
// ABOUTME: ordering and sample context wiring.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::error::SandboxError;
use crate::limit::time_limit;
use crate::sample::{SampleContext, sandbox, sandbox_with};

/// Provider that records the hooks it receives.
#[derive(Default)]
struct RecordingProvider {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SandboxProvider for RecordingProvider {
    fn kind(&self) -> &str {
        "recording"
    }

    fn default_concurrency(&self) -> Option<usize> {
        Some(2)
    }

    async fn task_init(&self, task_name: &str, config: Option<&str>) -> Result<(), SandboxError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("task_init {} {:?}", task_name, config));
        Ok(())
    }

    async fn sample_init(
        &self,
        _task_name: &str,
        _config: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> Result<SandboxEnvironments, SandboxError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("sample_init {}", metadata.len()));
        let web: Arc<dyn SandboxEnvironment> = Arc::new(LocalSandboxEnvironment::new()?);
        let default: Arc<dyn SandboxEnvironment> = Arc::new(LocalSandboxEnvironment::new()?);
        Ok(SandboxEnvironments::new(vec![
            ("web".to_string(), web),
            ("default".to_string(), default),
        ]))
    }

    async fn sample_cleanup(
        &self,
        _task_name: &str,
        _config: Option<&str>,
        environments: &SandboxEnvironments,
        interrupted: bool,
    ) -> Result<(), SandboxError> {
        self.calls.lock().unwrap().push(format!(
            "sample_cleanup {} {}",
            environments.len(),
            interrupted
        ));
        Ok(())
    }

    async fn task_cleanup(
        &self,
        _task_name: &str,
        _config: Option<&str>,
        cleanup: bool,
    ) -> Result<(), SandboxError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("task_cleanup {}", cleanup));
        Ok(())
    }

    async fn cli_cleanup(&self, id: Option<&str>) -> Result<(), SandboxError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("cli_cleanup {:?}", id));
        Ok(())
    }
}

#[test]
fn test_spec_parsing() {
    let spec: SandboxEnvironmentSpec = "docker".parse().unwrap();
    assert_eq!(spec, SandboxEnvironmentSpec::new("docker"));

    let spec: SandboxEnvironmentSpec = "docker:compose.yaml".parse().unwrap();
    assert_eq!(spec.kind, "docker");
    assert_eq!(spec.config.as_deref(), Some("compose.yaml"));
    assert_eq!(spec.to_string(), "docker:compose.yaml");

    assert!(":config".parse::<SandboxEnvironmentSpec>().is_err());
}

#[tokio::test]
async fn test_registry_builtins_and_lookup() {
    let registry = SandboxProviderRegistry::with_builtins().await;
    assert_eq!(registry.list().await, vec![LOCAL_SANDBOX]);
    assert!(registry.get(LOCAL_SANDBOX).await.is_ok());
    assert!(matches!(
        registry.get("k8s").await,
        Err(SandboxError::UnknownProvider(k)) if k == "k8s"
    ));
}

#[tokio::test]
async fn test_registry_clone_shares_state() {
    let registry = SandboxProviderRegistry::new();
    let clone = registry.clone();
    registry.register(RecordingProvider::default()).await;
    assert_eq!(clone.list().await, vec!["recording"]);
}

#[test]
fn test_environments_default_is_named_default() {
    let a: Arc<dyn SandboxEnvironment> = Arc::new(LocalSandboxEnvironment::new().unwrap());
    let b: Arc<dyn SandboxEnvironment> = Arc::new(LocalSandboxEnvironment::new().unwrap());
    let environments =
        SandboxEnvironments::new(vec![("web".to_string(), a), ("default".to_string(), b)]);

    assert_eq!(environments.default_name(), Some("default"));
    assert_eq!(environments.names(), vec!["default", "web"]);
    assert_eq!(environments.get(None).unwrap().0, "default");
    assert!(matches!(
        environments.get(Some("db")),
        Err(SandboxError::NotFound(n)) if n == "db"
    ));
}

#[test]
fn test_environments_default_falls_back_to_first() {
    let a: Arc<dyn SandboxEnvironment> = Arc::new(LocalSandboxEnvironment::new().unwrap());
    let environments = SandboxEnvironments::new(vec![("victim".to_string(), a)]);
    assert_eq!(environments.get(None).unwrap().0, "victim");
}

#[test]
fn test_empty_environments() {
    let environments = SandboxEnvironments::default();
    assert!(matches!(environments.get(None), Err(SandboxError::NoSandboxes)));
}

#[tokio::test]
async fn test_lifecycle_hook_order() {
    let provider = RecordingProvider::default();
    let calls = provider.calls.clone();
    let registry = SandboxProviderRegistry::new();
    registry.register(provider).await;

    let spec: SandboxEnvironmentSpec = "recording:cfg".parse().unwrap();
    let task = SandboxTask::init(&registry, "my-task", spec).await.unwrap();

    let metadata = HashMap::from([("difficulty".to_string(), "easy".to_string())]);
    let names = task
        .run_sample(SampleContext::new("s1"), &metadata, async {
            let default = sandbox(None).unwrap();
            let web = sandbox(Some("web")).unwrap();
            (default.name().to_string(), web.name().to_string())
        })
        .await
        .unwrap();
    assert_eq!(names, ("default".to_string(), "web".to_string()));

    task.finish().await.unwrap();
    cli_cleanup(&registry, "recording", Some("abc")).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "task_init my-task Some(\"cfg\")".to_string(),
            "sample_init 1".to_string(),
            "sample_cleanup 2 false".to_string(),
            "task_cleanup true".to_string(),
            "cli_cleanup Some(\"abc\")".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_no_sample_cleanup_when_disabled() {
    let provider = RecordingProvider::default();
    let calls = provider.calls.clone();
    let registry = SandboxProviderRegistry::new();
    registry.register(provider).await;

    let task = SandboxTask::init(&registry, "t", SandboxEnvironmentSpec::new("recording"))
        .await
        .unwrap()
        .cleanup(false);
    task.run_sample(SampleContext::new("s"), &HashMap::new(), async {})
        .await
        .unwrap();
    task.finish().await.unwrap();

    let calls = calls.lock().unwrap();
    assert!(!calls.iter().any(|c| c.starts_with("sample_cleanup")));
    assert_eq!(calls.last().map(String::as_str), Some("task_cleanup false"));
}

#[tokio::test]
async fn test_cancelled_sample_is_cleaned_up_as_interrupted() {
    let provider = RecordingProvider::default();
    let calls = provider.calls.clone();
    let registry = SandboxProviderRegistry::new();
    registry.register(provider).await;
    let task = SandboxTask::init(&registry, "t", SandboxEnvironmentSpec::new("recording"))
        .await
        .unwrap();

    let limit = time_limit(Some(0.05)).unwrap();
    let result = limit
        .run(task.run_sample(SampleContext::new("s"), &HashMap::new(), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }))
        .await;
    assert!(result.is_err());

    let cleaned_up = || {
        calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c == "sample_cleanup 2 true")
    };
    for _ in 0..100 {
        if cleaned_up() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(cleaned_up());
    assert!(!calls.lock().unwrap().iter().any(|c| c == "sample_cleanup 2 false"));
}

#[tokio::test]
async fn test_sandbox_with_finds_environment_containing_file() {
    let registry = SandboxProviderRegistry::new();
    registry.register(RecordingProvider::default()).await;
    let task = SandboxTask::init(&registry, "t", SandboxEnvironmentSpec::new("recording"))
        .await
        .unwrap();

    let found = task
        .run_sample(SampleContext::new("s"), &HashMap::new(), async {
            sandbox(Some("web"))
                .unwrap()
                .write_file_text("marker.txt", "x")
                .await
                .unwrap();
            let with = sandbox_with("marker.txt").await.unwrap();
            let missing = sandbox_with("absent.txt").await;
            (with.name().to_string(), missing.is_err())
        })
        .await
        .unwrap();

    assert_eq!(found, ("web".to_string(), true));
}

#[tokio::test]
async fn test_unknown_provider_fails_task_init() {
    let registry = SandboxProviderRegistry::new();
    let result = SandboxTask::init(&registry, "t", SandboxEnvironmentSpec::new("nope")).await;
    assert!(matches!(result, Err(SandboxError::UnknownProvider(_))));
}
