// ABOUTME: Computes store changes between snapshots and records them as
// ABOUTME: StoreEvents so mutations are visible in the transcript.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Store;
use crate::transcript::{Event, EventMeta, StoreEvent, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    Add,
    Replace,
    Remove,
}

/// A single key-level change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreChange {
    pub op: StoreOp,
    pub key: String,
    /// New value for add/replace, `None` for remove.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Changes that turn `before` into `after`, ordered by key.
pub fn store_changes(
    before: &BTreeMap<String, Value>,
    after: &BTreeMap<String, Value>,
) -> Vec<StoreChange> {
    let mut changes = Vec::new();
    for (key, value) in after {
        match before.get(key) {
            None => changes.push(StoreChange {
                op: StoreOp::Add,
                key: key.clone(),
                value: Some(value.clone()),
            }),
            Some(old) if old != value => changes.push(StoreChange {
                op: StoreOp::Replace,
                key: key.clone(),
                value: Some(value.clone()),
            }),
            Some(_) => {}
        }
    }
    for key in before.keys() {
        if !after.contains_key(key) {
            changes.push(StoreChange {
                op: StoreOp::Remove,
                key: key.clone(),
                value: None,
            });
        }
    }
    changes.sort_by(|a, b| a.key.cmp(&b.key));
    changes
}

/// Run `fut` and record a [`StoreEvent`] if it changed the store.
pub async fn track_store_changes<F: Future>(
    store: &Store,
    transcript: &Transcript,
    fut: F,
) -> F::Output {
    let before = store.snapshot();
    let output = fut.await;
    let changes = store_changes(&before, &store.snapshot());
    if !changes.is_empty() {
        tracing::debug!(changes = changes.len(), "store changed");
        transcript.record(Event::Store(StoreEvent {
            meta: EventMeta::now(),
            changes,
        }));
    }
    output
}
