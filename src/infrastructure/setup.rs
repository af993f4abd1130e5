//! Relay assembly
//!
//! Wires the configured adapters into a [`RelayService`]:
//! - Slack client, when a log or card channel is configured
//! - Correlation store (REST or in-memory), when cards or title memory need one
//! - Compiled filters and status labels
//!
//! [`build_dry_run_relay`] swaps both adapters for local fakes so a payload
//! can be pushed through the pipeline without touching Slack or the store.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::kv::{InMemoryStore, RestKvStore};
use crate::adapters::recording::RecordingChatClient;
use crate::adapters::slack::SlackClient;
use crate::domain::models::{Config, StoreBackend};
use crate::domain::ports::{ChatClient, CorrelationStore};
use crate::services::filters::FilterEngine;
use crate::services::relay::{RelayService, RelayServiceBuilder};
use crate::services::status_labels::StatusLabels;

/// Log channel used by dry runs when none is configured.
pub const DRY_RUN_LOG_CHANNEL: &str = "dry-run-log";
/// Card channel used by dry runs when none is configured.
pub const DRY_RUN_CARD_CHANNEL: &str = "dry-run-cards";

fn base_builder(config: &Config) -> Result<RelayServiceBuilder> {
    let filters = FilterEngine::new(&config.filters).context("Failed to compile filter rules")?;
    let labels = StatusLabels::new(&config.status_labels);

    Ok(RelayService::builder(filters, labels)
        .namespace(config.store.namespace.clone())
        .task_url_template(config.task_url_template.clone())
        .remember_titles(config.store.remember_titles))
}

/// Build a relay that records chat traffic instead of sending it and keeps
/// locators in memory. Unset channels get placeholder names.
pub fn build_dry_run_relay(config: &Config) -> Result<(RelayService, Arc<RecordingChatClient>)> {
    let chat = Arc::new(RecordingChatClient::new());
    let channel = |configured: &Option<String>, fallback: &str| {
        Some(configured.clone().unwrap_or_else(|| fallback.to_string()))
    };

    let relay = base_builder(config)?
        .log_channel(channel(&config.slack.log_channel, DRY_RUN_LOG_CHANNEL))
        .card_channel(channel(&config.slack.card_channel, DRY_RUN_CARD_CHANNEL))
        .chat(chat.clone())
        .store(Arc::new(InMemoryStore::new()))
        .build();
    Ok((relay, chat))
}

/// Build the relay described by `config`.
pub fn build_relay(config: &Config) -> Result<RelayService> {
    let mut builder = base_builder(config)?
        .log_channel(config.slack.log_channel.clone())
        .card_channel(config.slack.card_channel.clone());

    if let Some(chat) = build_chat(config)? {
        builder = builder.chat(chat);
    }
    if let Some(store) = build_store(config)? {
        builder = builder.store(store);
    }

    tracing::info!(
        log_channel = ?config.slack.log_channel,
        card_channel = ?config.slack.card_channel,
        store_backend = ?config.store.backend,
        remember_titles = config.store.remember_titles,
        "relay assembled"
    );
    Ok(builder.build())
}

fn build_chat(config: &Config) -> Result<Option<Arc<dyn ChatClient>>> {
    if config.slack.log_channel.is_none() && config.slack.card_channel.is_none() {
        tracing::warn!("no Slack channel configured; events will only be logged");
        return Ok(None);
    }
    let client = SlackClient::from_config(&config.slack)?;
    Ok(Some(Arc::new(client)))
}

fn build_store(config: &Config) -> Result<Option<Arc<dyn CorrelationStore>>> {
    if !config.store_required() {
        return Ok(None);
    }
    let store: Arc<dyn CorrelationStore> = match config.store.backend {
        StoreBackend::Rest => Arc::new(RestKvStore::from_config(&config.store)?),
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; card locators are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };
    Ok(Some(store))
}
