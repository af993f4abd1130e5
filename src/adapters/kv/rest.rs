//! Redis-over-REST correlation store (Upstash / Vercel KV).
//!
//! Each command is a JSON array POSTed to the endpoint root, e.g.
//! `["SET", "deskfy:42", "{...}", "NX"]`. The endpoint answers
//! `{"result": ...}` or `{"error": "..."}`. Values are stored as JSON text;
//! text that does not parse as JSON is returned as a plain string.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::StoreConfig;
use crate::domain::ports::CorrelationStore;
use crate::infrastructure::logging::SecretScrubber;

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// A [`CorrelationStore`] speaking the Upstash REST protocol.
#[derive(Clone)]
pub struct RestKvStore {
    http: Client,
    url: String,
    token: String,
    scrubber: SecretScrubber,
}

impl RestKvStore {
    /// Build a store from configuration. `rest_url` and `rest_token` must be set.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .rest_url
            .clone()
            .context("store.rest_url is required for the rest backend")?;
        let token = config
            .rest_token
            .clone()
            .context("store.rest_token is required for the rest backend")?;
        Self::new(url, token, Duration::from_secs(config.timeout_secs))
    }

    /// Create a store for the endpoint at `url`.
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build KV HTTP client")?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            token,
            scrubber: SecretScrubber::new(),
        })
    }

    async fn command(&self, operation: &str, args: &[&str]) -> DomainResult<Option<Value>> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| {
                DomainError::store(operation, self.scrubber.scrub_message(&format!("request failed: {e}")))
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DomainError::store(operation, format!("body read failed: {e}")))?;

        // Upstash reports command errors as {"error": ...} with a 4xx status.
        let parsed: Option<CommandResponse> = serde_json::from_str(&text).ok();
        if let Some(error) = parsed.as_ref().and_then(|r| r.error.clone()) {
            return Err(DomainError::store(operation, self.scrubber.scrub_message(&error)));
        }
        if !status.is_success() {
            return Err(DomainError::store(
                operation,
                self.scrubber.scrub_message(&format!("returned {status}: {text}")),
            ));
        }

        let parsed = parsed
            .ok_or_else(|| DomainError::store(operation, format!("unexpected response: {text}")))?;
        Ok(parsed.result.filter(|v| !v.is_null()))
    }
}

fn decode_stored(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

#[async_trait]
impl CorrelationStore for RestKvStore {
    async fn get(&self, key: &str) -> DomainResult<Option<Value>> {
        Ok(self.command("GET", &["GET", key]).await?.map(decode_stored))
    }

    async fn set(&self, key: &str, value: &Value) -> DomainResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.command("SET", &["SET", key, encoded.as_str()]).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &Value) -> DomainResult<bool> {
        let encoded = serde_json::to_string(value)?;
        let result = self.command("SET NX", &["SET", key, encoded.as_str(), "NX"]).await?;
        Ok(result.is_some())
    }
}

impl std::fmt::Debug for RestKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKvStore")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
