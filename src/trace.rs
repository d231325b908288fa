// ABOUTME: Tracing helpers for long-running actions (subprocesses, sandbox calls).
// ABOUTME: Logs enter/exit/error/cancel with elapsed time at target evalkit::trace.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

/// Log target used by every trace helper. Enable with
/// `RUST_LOG=evalkit::trace=debug`.
pub const TRACE_TARGET: &str = "evalkit::trace";

struct ActionGuard<'a> {
    action: &'a str,
    message: &'a str,
    start: Instant,
    finished: bool,
}

impl ActionGuard<'_> {
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                target: TRACE_TARGET,
                action = self.action,
                duration = self.elapsed(),
                "{} (cancelled)",
                self.message
            );
        }
    }
}

/// Run `fut`, tracing its start, completion or failure, and cancellation
/// (the future being dropped before it finished).
pub async fn trace_action<F, T, E>(action: &str, message: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    tracing::debug!(target: TRACE_TARGET, action, "{} (enter)", message);
    let mut guard = ActionGuard {
        action,
        message,
        start: Instant::now(),
        finished: false,
    };

    let result = fut.await;
    guard.finished = true;
    match &result {
        Ok(_) => tracing::debug!(
            target: TRACE_TARGET,
            action,
            duration = guard.elapsed(),
            "{} (exit)",
            message
        ),
        Err(e) => tracing::debug!(
            target: TRACE_TARGET,
            action,
            duration = guard.elapsed(),
            error = %e,
            "{} (error)",
            message
        ),
    }
    result
}

/// Log a single trace line for `action`.
pub fn trace_message(action: &str, message: impl Display) {
    tracing::debug!(target: TRACE_TARGET, action, "{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trace_action_passes_through_ok() {
        let result: Result<u32, String> = trace_action("test", "ok", async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_trace_action_passes_through_err() {
        let result: Result<u32, String> =
            trace_action("test", "err", async { Err("boom".to_string()) }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_trace_action_cancelled_future_does_not_panic() {
        let slow = trace_action::<_, (), String>("test", "slow", async {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            Ok(())
        });
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(10), slow).await;
        assert!(outcome.is_err());
    }
}
