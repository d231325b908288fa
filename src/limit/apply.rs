// ABOUTME: apply_limits - run a future inside several limits at once.

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{MessageLimit, TimeLimit, TokenLimit, WorkingTimeLimit};
use crate::error::LimitExceededError;

/// Any limit that can be applied around a future.
#[derive(Debug, Clone)]
pub enum Limit {
    Token(TokenLimit),
    Message(MessageLimit),
    Time(TimeLimit),
    Working(WorkingTimeLimit),
}

impl From<TokenLimit> for Limit {
    fn from(limit: TokenLimit) -> Self {
        Limit::Token(limit)
    }
}

impl From<MessageLimit> for Limit {
    fn from(limit: MessageLimit) -> Self {
        Limit::Message(limit)
    }
}

impl From<TimeLimit> for Limit {
    fn from(limit: TimeLimit) -> Self {
        Limit::Time(limit)
    }
}

impl From<WorkingTimeLimit> for Limit {
    fn from(limit: WorkingTimeLimit) -> Self {
        Limit::Working(limit)
    }
}

/// Run `fut` with every limit applied. The first limit is the outermost
/// scope. Only time limits produce an error here; the cooperative limits
/// fail from their `check_*` calls inside `fut`.
pub async fn apply_limits<'a, F>(
    limits: &[Limit],
    fut: F,
) -> Result<F::Output, LimitExceededError>
where
    F: Future + Send + 'a,
    F::Output: Send + 'a,
{
    let mut wrapped: BoxFuture<'a, Result<F::Output, LimitExceededError>> =
        fut.map(Ok).boxed();
    for limit in limits.iter().rev() {
        wrapped = match limit.clone() {
            Limit::Token(token) => async move { token.scope(wrapped).await }.boxed(),
            Limit::Message(message) => async move { message.scope(wrapped).await }.boxed(),
            Limit::Working(working) => async move { working.scope(wrapped).await }.boxed(),
            Limit::Time(time) => async move { time.run(wrapped).await.and_then(|r| r) }.boxed(),
        };
    }
    wrapped.await
}
