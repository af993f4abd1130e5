//! Recording port implementations for tests and dry runs.
//!
//! [`RecordingChatClient`] never talks to a chat provider: it remembers
//! every call and hands out sequential message references.
//! [`RecordingStore`] wraps an [`InMemoryStore`] and logs each operation.
//! Both can be told to fail, and the store can simulate a concurrent writer
//! or a slow conditional write.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::kv::InMemoryStore;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{ChatClient, CorrelationStore, PostedMessage};

/// A call received by [`RecordingChatClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    /// `post_message`.
    Post {
        /// Target channel.
        channel: String,
        /// Message body.
        text: String,
    },
    /// `update_message`.
    Update {
        /// Channel holding the message.
        channel: String,
        /// Message being rewritten.
        message_ref: String,
        /// New body.
        text: String,
    },
}

/// Chat client that records calls instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingChatClient {
    calls: Mutex<Vec<ChatCall>>,
    next_ref: AtomicU64,
    fail_posts: AtomicBool,
    fail_updates: AtomicBool,
}

impl RecordingChatClient {
    /// Create a client that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `post_message` calls fail (or succeed again).
    pub fn set_fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `update_message` calls fail (or succeed again).
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Only the `post_message` calls.
    pub fn posts(&self) -> Vec<ChatCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ChatCall::Post { .. }))
            .collect()
    }

    /// Only the `update_message` calls.
    pub fn updates(&self) -> Vec<ChatCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ChatCall::Update { .. }))
            .collect()
    }

    fn record(&self, call: ChatCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ChatClient for RecordingChatClient {
    async fn post_message(&self, channel: &str, text: &str) -> DomainResult<PostedMessage> {
        self.record(ChatCall::Post {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(DomainError::chat("post_message", "not_in_channel"));
        }
        let n = self.next_ref.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PostedMessage {
            channel: channel.to_string(),
            message_ref: format!("ts-{n}"),
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        message_ref: &str,
        text: &str,
    ) -> DomainResult<()> {
        self.record(ChatCall::Update {
            channel: channel.to_string(),
            message_ref: message_ref.to_string(),
            text: text.to_string(),
        });
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DomainError::chat("update_message", "message_not_found"));
        }
        Ok(())
    }
}

/// An operation received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get`.
    Get(String),
    /// `set`.
    Set(String),
    /// `set_if_absent`.
    SetIfAbsent(String),
}

/// In-memory store that records operations.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    fail_all: AtomicBool,
    fail_conditional_writes: AtomicBool,
    conditional_write_delay: Mutex<Option<Duration>>,
    concurrent_writer: Mutex<Option<Value>>,
}

impl RecordingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail (or succeed again).
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make `set_if_absent` fail (or succeed again) while reads keep working.
    pub fn set_fail_conditional_writes(&self, fail: bool) {
        self.fail_conditional_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every `set_if_absent` for `delay` before it lands.
    pub fn set_conditional_write_delay(&self, delay: Duration) {
        if let Ok(mut slot) = self.conditional_write_delay.lock() {
            *slot = Some(delay);
        }
    }

    /// Simulate another instance writing `value` to the key right before
    /// the next `set_if_absent` lands.
    pub fn preempt_next_conditional_write(&self, value: Value) {
        if let Ok(mut slot) = self.concurrent_writer.lock() {
            *slot = Some(value);
        }
    }

    /// Every operation received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of write operations (`set` and `set_if_absent`).
    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, StoreCall::Get(_)))
            .count()
    }

    /// Read a value without recording the access.
    pub async fn peek(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await.ok().flatten()
    }

    fn record(&self, call: StoreCall) -> DomainResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DomainError::store("request", "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CorrelationStore for RecordingStore {
    async fn get(&self, key: &str) -> DomainResult<Option<Value>> {
        self.record(StoreCall::Get(key.to_string()))?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> DomainResult<()> {
        self.record(StoreCall::Set(key.to_string()))?;
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: &Value) -> DomainResult<bool> {
        self.record(StoreCall::SetIfAbsent(key.to_string()))?;
        let delay = self.conditional_write_delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_conditional_writes.load(Ordering::SeqCst) {
            return Err(DomainError::store("SET NX", "connection reset"));
        }
        let preempted = self
            .concurrent_writer
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(winner) = preempted {
            self.inner.set(key, &winner).await?;
        }
        self.inner.set_if_absent(key, value).await
    }
}
