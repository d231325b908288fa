// ABOUTME: Sandbox module - execution/filesystem environments for untrusted
// ABOUTME: commands, their limits, and provider lifecycle hooks.

mod environment;
mod environments;
mod limits;
mod local;
mod provider;
mod proxy;

pub use environment::*;
pub use environments::{DEFAULT_SANDBOX_NAME, SandboxEnvironments};
pub use limits::*;
pub use local::{LOCAL_SANDBOX, LocalSandboxEnvironment, LocalSandboxProvider};
pub use provider::*;
pub use proxy::SandboxEnvironmentProxy;

#[cfg(test)]
mod provider_test;
