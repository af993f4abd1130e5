//! Correlation store port.
//!
//! A plain key-value store holding JSON documents. There are no
//! transactions; the only atomic primitive is [`CorrelationStore::set_if_absent`].

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::DomainResult;

/// Port for the external key-value store mapping task IDs to card locators.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> DomainResult<Option<Value>>;

    /// Store `value` under `key`, replacing any existing value.
    async fn set(&self, key: &str, value: &Value) -> DomainResult<()>;

    /// Store `value` under `key` only if the key holds nothing yet.
    ///
    /// Returns `true` when this call wrote the value. The default
    /// implementation is a read followed by a write and is not atomic;
    /// backends with a native conditional write should override it.
    async fn set_if_absent(&self, key: &str, value: &Value) -> DomainResult<bool> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }
}
