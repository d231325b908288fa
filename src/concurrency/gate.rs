// ABOUTME: Named concurrency gates backed by tokio semaphores.
// ABOUTME: Each key gets one gate; permits are released on drop.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::error::ConcurrencyError;

struct Gate {
    name: String,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

/// Usage of a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyStatus {
    pub key: String,
    pub name: String,
    pub in_use: usize,
    pub capacity: usize,
}

/// A held slot in a concurrency gate. The slot is freed when dropped.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    key: String,
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyPermit {
    /// The key of the gate this permit belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A set of named concurrency gates.
///
/// # Gate semantics
///
/// - A gate is created the first time its key is used, with the capacity
///   given at that time. Later calls with a different capacity share the
///   existing gate.
/// - At most `capacity` permits for a key exist at any instant.
/// - Waiters are admitted in the order tokio's semaphore grants permits.
#[derive(Default)]
pub struct ConcurrencyRegistry {
    gates: Mutex<HashMap<String, Gate>>,
}

impl ConcurrencyRegistry {
    /// Create a new registry with no gates.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`concurrency`].
    pub fn global() -> &'static ConcurrencyRegistry {
        static GLOBAL: OnceLock<ConcurrencyRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ConcurrencyRegistry::new)
    }

    async fn semaphore(
        &self,
        name: &str,
        limit: usize,
        key: Option<&str>,
    ) -> Result<(String, Arc<Semaphore>), ConcurrencyError> {
        if limit == 0 {
            return Err(ConcurrencyError::InvalidLimit(name.to_string()));
        }
        let key = key.unwrap_or(name).to_string();
        let mut gates = self.gates.lock().await;
        let gate = gates.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(key = %key, name, limit, "creating concurrency gate");
            Gate {
                name: name.to_string(),
                capacity: limit,
                semaphore: Arc::new(Semaphore::new(limit)),
            }
        });
        Ok((key, Arc::clone(&gate.semaphore)))
    }

    /// Wait for a slot in the gate for `key` (or `name` when no key is given).
    pub async fn acquire(
        &self,
        name: &str,
        limit: usize,
        key: Option<&str>,
    ) -> Result<ConcurrencyPermit, ConcurrencyError> {
        self.acquire_with_cancel(name, limit, key, std::future::pending::<()>())
            .await
    }

    /// Wait for a slot, giving up when `cancel` completes first.
    ///
    /// Returns `Err(ConcurrencyError::Cancelled)` if the cancel future wins.
    pub async fn acquire_with_cancel<F>(
        &self,
        name: &str,
        limit: usize,
        key: Option<&str>,
        cancel: F,
    ) -> Result<ConcurrencyPermit, ConcurrencyError>
    where
        F: Future<Output = ()>,
    {
        let (key, semaphore) = self.semaphore(name, limit, key).await?;
        tokio::pin!(cancel);

        tokio::select! {
            biased;
            () = &mut cancel => Err(ConcurrencyError::Cancelled),
            permit = semaphore.acquire_owned() => {
                let permit = permit.map_err(|_| ConcurrencyError::Closed(key.clone()))?;
                Ok(ConcurrencyPermit { key, _permit: permit })
            }
        }
    }

    /// Usage of every gate, sorted by key.
    pub async fn status(&self) -> Vec<ConcurrencyStatus> {
        let gates = self.gates.lock().await;
        let mut status: Vec<_> = gates
            .iter()
            .map(|(key, gate)| ConcurrencyStatus {
                key: key.clone(),
                name: gate.name.clone(),
                in_use: gate.capacity - gate.semaphore.available_permits(),
                capacity: gate.capacity,
            })
            .collect();
        status.sort_by(|a, b| a.key.cmp(&b.key));
        status
    }
}

/// Enter the named concurrency context in the global registry.
///
/// # Arguments
///
/// * `name` - Name of the context, used for status display.
/// * `limit` - Maximum number of concurrent holders.
/// * `key` - Gate key; defaults to `name`. Use distinct keys to give
///   contexts with the same display name separate gates.
pub async fn concurrency(
    name: &str,
    limit: usize,
    key: Option<&str>,
) -> Result<ConcurrencyPermit, ConcurrencyError> {
    ConcurrencyRegistry::global().acquire(name, limit, key).await
}

/// Like [`concurrency`], but gives up when `cancel` completes first.
pub async fn concurrency_with_cancel<F>(
    name: &str,
    limit: usize,
    key: Option<&str>,
    cancel: F,
) -> Result<ConcurrencyPermit, ConcurrencyError>
where
    F: Future<Output = ()>,
{
    ConcurrencyRegistry::global()
        .acquire_with_cancel(name, limit, key, cancel)
        .await
}

/// Usage of every gate in the global registry.
pub async fn concurrency_status() -> Vec<ConcurrencyStatus> {
    ConcurrencyRegistry::global().status().await
}
