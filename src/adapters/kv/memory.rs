//! In-process correlation store.
//!
//! Only correct for a single relay instance: locators live and die with the
//! process. Meant for local development, `replay`, and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::ports::CorrelationStore;

/// A [`CorrelationStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CorrelationStore for InMemoryStore {
    async fn get(&self, key: &str) -> DomainResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> DomainResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &Value) -> DomainResult<bool> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("deskfy:1").await.unwrap(), None);

        store.set("deskfy:1", &json!({ "channel": "C1", "ts": "1.0" })).await.unwrap();
        assert_eq!(
            store.get("deskfy:1").await.unwrap(),
            Some(json!({ "channel": "C1", "ts": "1.0" }))
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_if_absent_keeps_first_value() {
        let store = InMemoryStore::new();
        assert!(store.set_if_absent("k", &json!("first")).await.unwrap());
        assert!(!store.set_if_absent("k", &json!("second")).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(json!("first")));
    }
}
