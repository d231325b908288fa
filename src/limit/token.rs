// ABOUTME: Token limits - usage recorded against a tree of task-local scopes,
// ABOUTME: checked cooperatively against every enclosing limit.

use std::future::Future;
use std::ops::{Add, AddAssign};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::{SharedLimit, exceeded};
use crate::error::{LimitExceededError, LimitKind};

/// Token usage reported by a model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_cache_write: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_cache_read: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

impl ModelUsage {
    /// Usage with only input and output counts; the total is their sum.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            ..Self::default()
        }
    }
}

fn add_optional(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}

impl Add for ModelUsage {
    type Output = ModelUsage;

    fn add(self, rhs: Self) -> Self::Output {
        ModelUsage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
            input_tokens_cache_write: add_optional(
                self.input_tokens_cache_write,
                rhs.input_tokens_cache_write,
            ),
            input_tokens_cache_read: add_optional(
                self.input_tokens_cache_read,
                rhs.input_tokens_cache_read,
            ),
            reasoning_tokens: add_optional(self.reasoning_tokens, rhs.reasoning_tokens),
        }
    }
}

impl AddAssign for ModelUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// One active token limit scope. Points at the scope that was active when
/// it was opened.
struct TokenLimitNode {
    limit: SharedLimit,
    parent: Option<Arc<TokenLimitNode>>,
    usage: Mutex<ModelUsage>,
}

impl TokenLimitNode {
    fn record(&self, usage: &ModelUsage) {
        let mut node = Some(self);
        while let Some(current) = node {
            *current.usage.lock().unwrap_or_else(PoisonError::into_inner) += *usage;
            node = current.parent.as_deref();
        }
    }

    fn check(&self) -> Result<(), LimitExceededError> {
        let mut node = Some(self);
        while let Some(current) = node {
            current.check_self()?;
            node = current.parent.as_deref();
        }
        Ok(())
    }

    fn check_self(&self) -> Result<(), LimitExceededError> {
        let Some(limit) = self.limit.get() else {
            return Ok(());
        };
        let total = self
            .usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_tokens;
        if total > limit {
            let message = format!("Token limit exceeded. value: {}; limit: {}", total, limit);
            return Err(exceeded(
                LimitKind::Token,
                total as f64,
                limit as f64,
                message,
            ));
        }
        Ok(())
    }
}

tokio::task_local! {
    static TOKEN_LEAF: Arc<TokenLimitNode>;
}

fn leaf() -> Option<Arc<TokenLimitNode>> {
    TOKEN_LEAF.try_with(Arc::clone).ok()
}

/// Limits the total number of tokens used while a scope is open.
///
/// Tokens used before a scope was opened are not counted. The handle can
/// open any number of scopes, nested or concurrent. `None` is unlimited.
#[derive(Debug, Clone)]
pub struct TokenLimit {
    limit: SharedLimit,
}

pub fn token_limit(limit: Option<u64>) -> TokenLimit {
    TokenLimit {
        limit: SharedLimit::new(limit),
    }
}

impl TokenLimit {
    pub fn limit(&self) -> Option<u64> {
        self.limit.get()
    }

    /// Change the limit of this handle and of every scope opened from it.
    /// Does not check the new limit.
    pub fn set_limit(&self, limit: Option<u64>) {
        self.limit.set(limit);
    }

    /// Run `fut` inside a new token limit scope.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        let node = Arc::new(TokenLimitNode {
            limit: self.limit.clone(),
            parent: leaf(),
            usage: Mutex::new(ModelUsage::default()),
        });
        TOKEN_LEAF.scope(node, fut).await
    }
}

/// Record usage against the innermost token scope and all its ancestors.
/// Does not check limits.
pub fn record_model_usage(usage: &ModelUsage) {
    if let Some(node) = leaf() {
        node.record(usage);
    }
}

/// Check every token limit enclosing the current task, innermost first.
pub fn check_token_limit() -> Result<(), LimitExceededError> {
    match leaf() {
        Some(node) => node.check(),
        None => Ok(()),
    }
}
