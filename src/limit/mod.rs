// ABOUTME: Limits on tokens, messages, wall-clock time and working time.
// ABOUTME: Scopes are task-local and nest; exceeding one yields LimitExceededError.

//! Limits are applied by running a future inside a scope. Scopes opened
//! while another scope of the same kind is active become its children, so
//! checks see every enclosing limit. Scope state is task-local: a spawned
//! task starts outside every limit unless its future is wrapped again.
//!
//! Token, message and working time limits are cooperative. Code that uses
//! tokens or grows a conversation must call the matching `check_*`
//! function. Time limits cancel the wrapped future.

mod apply;
mod message;
mod time;
mod token;
mod working;

pub use apply::{Limit, apply_limits};
pub use message::{MessageLimit, check_message_limit, message_limit};
pub use time::{TimeLimit, time_limit};
pub use token::{ModelUsage, TokenLimit, check_token_limit, record_model_usage, token_limit};
pub use working::{
    WorkingTimeLimit, check_working_time_limit, record_waiting_time, working_time_limit,
};

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{LimitError, LimitExceededError, LimitKind};
use crate::sample::transcript;
use crate::transcript::{Event, EventMeta, SampleLimitEvent};

/// A limit value shared by every scope opened from the same handle, so that
/// updating it affects scopes that are already active.
#[derive(Debug, Clone, Default)]
struct SharedLimit(Arc<RwLock<Option<u64>>>);

impl SharedLimit {
    fn new(value: Option<u64>) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    fn get(&self) -> Option<u64> {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, value: Option<u64>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Reject negative and NaN second counts.
fn validate_seconds(kind: LimitKind, value: Option<f64>) -> Result<Option<f64>, LimitError> {
    match value {
        Some(v) if v.is_nan() || v < 0.0 => Err(LimitError::InvalidValue { kind, value: v }),
        other => Ok(other),
    }
}

/// Record a limit event in the current transcript and build the error.
fn exceeded(kind: LimitKind, value: f64, limit: f64, message: String) -> LimitExceededError {
    tracing::info!(kind = %kind, value, limit, "{}", message);
    transcript().record(Event::SampleLimit(SampleLimitEvent {
        meta: EventMeta::now(),
        kind,
        message: message.clone(),
        limit: Some(limit),
    }));
    LimitExceededError::new(kind, value, limit, Some(message))
}

#[cfg(test)]
mod token_test;
