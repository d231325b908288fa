// ABOUTME: Implements the Store - a thread-safe map from string keys to JSON
// ABOUTME: values, scoped to a single sample.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// Per-sample key/value store.
///
/// Cloning a `Store` yields another handle to the same state.
#[derive(Clone, Default)]
pub struct Store {
    data: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Store {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `data`.
    pub fn from_map(data: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data.into_iter().collect())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Value>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Value>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Get a value, inserting `default` first if the key is missing.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.write()
            .entry(key.to_string())
            .or_insert_with(|| default.into())
            .clone()
    }

    /// Get a value and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Deserialize {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Set a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.write().insert(key.into(), value.into())
    }

    /// Serialize `value` and store it under `key`.
    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Remove a key, returning its value.
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// All key/value pairs, sorted by key.
    pub fn items(&self) -> Vec<(String, Value)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// A point-in-time copy of the store contents.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.read().clone()
    }

    /// Load a model whose fields are stored under `"{namespace}:{field}"`.
    ///
    /// Missing fields are left out of the object handed to serde, so
    /// `#[serde(default)]` on the model fills them in.
    pub fn load_model<T: DeserializeOwned>(&self, namespace: &str) -> Result<T, StoreError> {
        let prefix = format!("{}:", namespace);
        let object: serde_json::Map<String, Value> = self
            .read()
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .filter(|field| !field.contains(':'))
                    .map(|field| (field.to_string(), v.clone()))
            })
            .collect();
        serde_json::from_value(Value::Object(object)).map_err(|source| StoreError::Deserialize {
            key: namespace.to_string(),
            source,
        })
    }

    /// Save each top-level field of `model` under `"{namespace}:{field}"`.
    pub fn save_model<T: Serialize>(&self, namespace: &str, model: &T) -> Result<(), StoreError> {
        let Value::Object(fields) = serde_json::to_value(model)? else {
            return Err(StoreError::NotAnObject(namespace.to_string()));
        };
        let mut data = self.write();
        for (field, value) in fields {
            data.insert(format!("{}:{}", namespace, field), value);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.read().iter()).finish()
    }
}
