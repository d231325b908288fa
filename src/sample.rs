// ABOUTME: Task-local sample context giving ambient access to the current
// ABOUTME: sample's store, transcript and sandbox environments.

use std::future::Future;

use crate::error::SandboxError;
use crate::sandbox::{SandboxEnvironmentProxy, SandboxEnvironments};
use crate::store::Store;
use crate::transcript::Transcript;

tokio::task_local! {
    static SAMPLE: SampleContext;
}

/// State scoped to a single sample.
///
/// Installed for the duration of a future with [`SampleContext::run`]. Tasks
/// spawned from inside the future do not inherit it; run them inside their
/// own `run` call with a clone of the context.
#[derive(Clone, Debug)]
pub struct SampleContext {
    id: String,
    store: Store,
    transcript: Transcript,
    sandboxes: SandboxEnvironments,
}

impl SampleContext {
    /// Create a context with an empty store, transcript and no sandboxes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            store: Store::new(),
            transcript: Transcript::new(),
            sandboxes: SandboxEnvironments::default(),
        }
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_sandboxes(mut self, sandboxes: SandboxEnvironments) -> Self {
        self.sandboxes = sandboxes;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn sandboxes(&self) -> &SandboxEnvironments {
        &self.sandboxes
    }

    /// Run `fut` with this context installed.
    pub async fn run<F: Future>(self, fut: F) -> F::Output {
        SAMPLE.scope(self, fut).await
    }

    /// The context of the sample currently running, if any.
    pub fn current() -> Option<SampleContext> {
        SAMPLE.try_with(Clone::clone).ok()
    }
}

/// The current sample's store.
///
/// Outside a sample this returns a fresh store, so writes made there are not
/// retained.
pub fn store() -> Store {
    SAMPLE
        .try_with(|ctx| ctx.store.clone())
        .unwrap_or_default()
}

/// The current sample's transcript, or a detached one outside a sample.
pub fn transcript() -> Transcript {
    SAMPLE
        .try_with(|ctx| ctx.transcript.clone())
        .unwrap_or_else(|_| Transcript::detached())
}

/// A sandbox environment of the current sample.
///
/// `None` selects the default environment.
pub fn sandbox(name: Option<&str>) -> Result<SandboxEnvironmentProxy, SandboxError> {
    let ctx = SampleContext::current().ok_or(SandboxError::NoSandboxes)?;
    ctx.sandboxes.proxy(name, ctx.transcript.clone())
}

/// The first sandbox environment of the current sample in which `file`
/// exists.
pub async fn sandbox_with(file: &str) -> Result<SandboxEnvironmentProxy, SandboxError> {
    let ctx = SampleContext::current().ok_or(SandboxError::NoSandboxes)?;
    let name = ctx.sandboxes.name_with_file(file).await?;
    ctx.sandboxes.proxy(Some(&name), ctx.transcript.clone())
}
