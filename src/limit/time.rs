// ABOUTME: Time limits - cancel a future once a wall-clock budget is spent.

use std::future::Future;
use std::time::Duration;

use super::{exceeded, validate_seconds};
use crate::error::{LimitError, LimitExceededError, LimitKind};

/// Limits the wall-clock time a future may run. Reusable: every `run`
/// starts a fresh timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLimit {
    limit: Option<f64>,
}

/// A time limit of `limit` seconds; `None` is unlimited.
pub fn time_limit(limit: Option<f64>) -> Result<TimeLimit, LimitError> {
    Ok(TimeLimit {
        limit: validate_seconds(LimitKind::Time, limit)?,
    })
}

impl TimeLimit {
    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    /// Run `fut`, cancelling it if the limit elapses first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, LimitExceededError> {
        // Budgets too large for a Duration are treated as unlimited.
        let Some((limit, duration)) = self
            .limit
            .and_then(|l| Duration::try_from_secs_f64(l).ok().map(|d| (l, d)))
        else {
            return Ok(fut.await);
        };

        match tokio::time::timeout(duration, fut).await {
            Ok(output) => Ok(output),
            Err(_) => {
                let message = format!("Time limit exceeded. limit: {:.2} seconds", limit);
                Err(exceeded(LimitKind::Time, limit, limit, message))
            }
        }
    }
}
