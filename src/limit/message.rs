// ABOUTME: Message limits - cap conversation length. Only the innermost
// ABOUTME: active scope is checked.

use std::future::Future;
use std::sync::Arc;

use super::{SharedLimit, exceeded};
use crate::error::{LimitExceededError, LimitKind};

struct MessageLimitNode {
    limit: SharedLimit,
}

tokio::task_local! {
    static MESSAGE_LEAF: Arc<MessageLimitNode>;
}

/// Limits the number of messages in a conversation. The whole conversation
/// is compared to the limit, not only messages added inside the scope.
#[derive(Debug, Clone)]
pub struct MessageLimit {
    limit: SharedLimit,
}

pub fn message_limit(limit: Option<u64>) -> MessageLimit {
    MessageLimit {
        limit: SharedLimit::new(limit),
    }
}

impl MessageLimit {
    pub fn limit(&self) -> Option<u64> {
        self.limit.get()
    }

    /// Change the limit of this handle and of every scope opened from it.
    pub fn set_limit(&self, limit: Option<u64>) {
        self.limit.set(limit);
    }

    /// Run `fut` with this limit as the innermost message limit.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        let node = Arc::new(MessageLimitNode {
            limit: self.limit.clone(),
        });
        MESSAGE_LEAF.scope(node, fut).await
    }
}

/// Check `count` against the innermost message limit. With
/// `raise_for_equal`, reaching the limit also fails so that a call which
/// would exceed it is not made.
pub fn check_message_limit(count: u64, raise_for_equal: bool) -> Result<(), LimitExceededError> {
    let Ok(Some(limit)) = MESSAGE_LEAF.try_with(|node| node.limit.get()) else {
        return Ok(());
    };
    if count > limit || (raise_for_equal && count == limit) {
        let verb = if count == limit { "reached" } else { "exceeded" };
        let message = format!("Message limit {}. count: {}; limit: {}", verb, count, limit);
        return Err(exceeded(
            LimitKind::Message,
            count as f64,
            limit as f64,
            message,
        ));
    }
    Ok(())
}
