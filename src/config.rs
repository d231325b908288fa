// ABOUTME: Runtime configuration read from EVALKIT_* environment variables
// ABOUTME: and applied to the process-wide subprocess gate and display type.

use crate::display::{DisplayType, init_display_type};
use crate::error::ConfigError;
use crate::subprocess::init_max_subprocesses;

pub const MAX_SUBPROCESSES_VAR: &str = "EVALKIT_MAX_SUBPROCESSES";
pub const MAX_SANDBOXES_VAR: &str = "EVALKIT_MAX_SANDBOXES";
pub const DISPLAY_VAR: &str = "EVALKIT_DISPLAY";
pub const LOG_LEVEL_VAR: &str = "EVALKIT_LOG_LEVEL";

/// Process-wide settings. Unset variables leave the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Cap on concurrent subprocesses; defaults to the CPU count.
    pub max_subprocesses: Option<usize>,
    /// Cap on samples holding sandboxes at once, overriding provider defaults.
    /// Hand it to [`SandboxTask::max_samples`](crate::sandbox::SandboxTask::max_samples).
    pub max_sandboxes: Option<usize>,
    pub display: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            max_subprocesses: parse_count(MAX_SUBPROCESSES_VAR, non_empty(MAX_SUBPROCESSES_VAR))?,
            max_sandboxes: parse_count(MAX_SANDBOXES_VAR, non_empty(MAX_SANDBOXES_VAR))?,
            display: non_empty(DISPLAY_VAR),
            log_level: non_empty(LOG_LEVEL_VAR),
        })
    }

    /// Initialize the subprocess gate and display type from this config.
    pub fn apply(&self) -> DisplayType {
        init_max_subprocesses(self.max_subprocesses);
        init_display_type(self.display.as_deref())
    }
}

fn parse_count(key: &str, value: Option<String>) -> Result<Option<usize>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        Ok(_) => Err(invalid(key, &value, "must be at least 1")),
        Err(e) => Err(invalid(key, &value, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
