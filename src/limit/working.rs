// ABOUTME: Working time limits - elapsed time minus recorded waiting time
// ABOUTME: (e.g. queueing for a model or sandbox), checked cooperatively.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Instant;

use super::{exceeded, validate_seconds};
use crate::error::{LimitError, LimitExceededError, LimitKind};

struct WorkingTimeNode {
    limit: Option<f64>,
    start: Instant,
    waiting: Mutex<f64>,
    parent: Option<Arc<WorkingTimeNode>>,
}

impl WorkingTimeNode {
    fn working_time(&self) -> f64 {
        let waiting = *self.waiting.lock().unwrap_or_else(PoisonError::into_inner);
        self.start.elapsed().as_secs_f64() - waiting
    }

    fn check_self(&self) -> Result<(), LimitExceededError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let working = self.working_time();
        if working > limit {
            let message = format!(
                "Working time limit exceeded. value: {:.2} seconds; limit: {:.2} seconds",
                working, limit
            );
            return Err(exceeded(LimitKind::Working, working, limit, message));
        }
        Ok(())
    }

    fn ancestors(&self) -> impl Iterator<Item = &WorkingTimeNode> {
        std::iter::successors(Some(self), |node| node.parent.as_deref())
    }
}

tokio::task_local! {
    static WORKING_LEAF: Arc<WorkingTimeNode>;
}

fn leaf() -> Option<Arc<WorkingTimeNode>> {
    WORKING_LEAF.try_with(Arc::clone).ok()
}

/// Limits working time: time spent inside the scope that was not recorded
/// as waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingTimeLimit {
    limit: Option<f64>,
}

/// A working time limit of `limit` seconds; `None` is unlimited.
pub fn working_time_limit(limit: Option<f64>) -> Result<WorkingTimeLimit, LimitError> {
    Ok(WorkingTimeLimit {
        limit: validate_seconds(LimitKind::Working, limit)?,
    })
}

impl WorkingTimeLimit {
    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    /// Run `fut` inside a new working time scope. The clock starts now.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        let node = Arc::new(WorkingTimeNode {
            limit: self.limit,
            start: Instant::now(),
            waiting: Mutex::new(0.0),
            parent: leaf(),
        });
        WORKING_LEAF.scope(node, fut).await
    }
}

/// Subtract `seconds` of waiting from the innermost working time scope and
/// all its ancestors.
pub fn record_waiting_time(seconds: f64) {
    if let Some(node) = leaf() {
        for node in node.ancestors() {
            *node.waiting.lock().unwrap_or_else(PoisonError::into_inner) += seconds;
        }
    }
}

/// Check every working time limit enclosing the current task, innermost
/// first.
pub fn check_working_time_limit() -> Result<(), LimitExceededError> {
    match leaf() {
        Some(node) => node.ancestors().try_for_each(WorkingTimeNode::check_self),
        None => Ok(()),
    }
}
