//! Relay pipeline.
//!
//! Turns one decoded webhook body into chat traffic: extract fields,
//! resolve the title, apply filters, post the per-event log message, then
//! hand a [`NotificationRecord`] to the [`CardSynchronizer`].
//!
//! Downstream failures are logged and counted in [`RelayStats`] but never
//! turned into errors: the webhook source only learns about filtering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::models::{title_key, EventKind, InboundEvent, NotificationRecord};
use crate::domain::ports::{ChatClient, CorrelationStore};
use crate::services::card_sync::{CardSynchronizer, SyncOutcome};
use crate::services::filters::{FilterEngine, IgnoreReason};
use crate::services::rendering::{render_event, task_url, MessageContext};
use crate::services::status_labels::StatusLabels;

/// Title used when neither the payload nor the store knows one.
pub const UNTITLED: &str = "Untitled task";

/// Result of relaying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The event matched a filter.
    Ignored(IgnoreReason),
    /// The event passed the filters and was forwarded.
    Delivered {
        /// Event kind.
        event: EventKind,
        /// Task identifier, when present.
        task_id: Option<String>,
        /// Whether the log message was posted; `None` without a log channel.
        log_posted: Option<bool>,
        /// Card synchronization result; `None` when cards are disabled.
        card: Option<SyncOutcome>,
    },
}

/// Counters describing what the relay has done since start.
#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    ignored: AtomicU64,
    delivered: AtomicU64,
    log_posts_failed: AtomicU64,
    cards_created: AtomicU64,
    cards_updated: AtomicU64,
    card_creates_failed: AtomicU64,
    card_updates_failed: AtomicU64,
    store_failures: AtomicU64,
    lost_races: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Webhooks processed.
    pub received: u64,
    /// Webhooks filtered out.
    pub ignored: u64,
    /// Webhooks forwarded.
    pub delivered: u64,
    /// Log messages the chat provider rejected.
    pub log_posts_failed: u64,
    /// Cards posted.
    pub cards_created: u64,
    /// Cards rewritten.
    pub cards_updated: u64,
    /// Card posts the chat provider rejected.
    pub card_creates_failed: u64,
    /// Card rewrites the chat provider rejected.
    pub card_updates_failed: u64,
    /// Correlation store failures.
    pub store_failures: u64,
    /// Concurrent creations lost to another instance.
    pub lost_races: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl RelayStats {
    /// Copy the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let read = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            received: read(&self.received),
            ignored: read(&self.ignored),
            delivered: read(&self.delivered),
            log_posts_failed: read(&self.log_posts_failed),
            cards_created: read(&self.cards_created),
            cards_updated: read(&self.cards_updated),
            card_creates_failed: read(&self.card_creates_failed),
            card_updates_failed: read(&self.card_updates_failed),
            store_failures: read(&self.store_failures),
            lost_races: read(&self.lost_races),
        }
    }

    fn record_sync(&self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Skipped => {}
            SyncOutcome::Created(_) => bump(&self.cards_created),
            SyncOutcome::Updated(_) => bump(&self.cards_updated),
            SyncOutcome::LostRace { .. } => {
                bump(&self.lost_races);
                bump(&self.cards_updated);
            }
            SyncOutcome::CreateFailed => bump(&self.card_creates_failed),
            SyncOutcome::UpdateFailed(_) => bump(&self.card_updates_failed),
            SyncOutcome::StoreFailed => bump(&self.store_failures),
        }
    }
}

/// Relays Deskfy events to chat.
pub struct RelayService {
    chat: Option<Arc<dyn ChatClient>>,
    store: Option<Arc<dyn CorrelationStore>>,
    cards: Option<CardSynchronizer>,
    filters: FilterEngine,
    labels: StatusLabels,
    log_channel: Option<String>,
    task_url_template: String,
    namespace: String,
    remember_titles: bool,
    stats: RelayStats,
}

impl RelayService {
    /// Start building a relay around `filters` and `labels`.
    pub fn builder(filters: FilterEngine, labels: StatusLabels) -> RelayServiceBuilder {
        RelayServiceBuilder {
            service: Self {
                chat: None,
                store: None,
                cards: None,
                filters,
                labels,
                log_channel: None,
                task_url_template: String::new(),
                namespace: "deskfy".to_string(),
                remember_titles: false,
                stats: RelayStats::default(),
            },
            card_channel: None,
        }
    }

    /// Counters since start.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Relay one decoded webhook body.
    pub async fn process(&self, body: &Value) -> RelayOutcome {
        bump(&self.stats.received);

        let event = InboundEvent::from_value(body);
        let kind = event.kind_or_default();
        tracing::info!(event = %kind, task_id = ?event.task_id, "event received");

        let title = self.resolve_title(&event).await;

        if let Some(reason) = self.filters.evaluate(&event, &title) {
            bump(&self.stats.ignored);
            tracing::info!(
                event = %kind,
                task_id = ?event.task_id,
                title = %title,
                reason = reason.code(),
                detail = %reason.description(),
                "event ignored"
            );
            return RelayOutcome::Ignored(reason);
        }

        let status = self.labels.translate(event.status.as_deref());
        let log_posted = self.post_log_message(&event, &kind, &title, &status).await;

        let card = match &self.cards {
            Some(cards) => {
                let record = NotificationRecord::new(event.task_id.clone(), title, status)
                    .with_author(event.author.clone())
                    .with_message(event.message.clone());
                let outcome = cards.sync(&record).await;
                self.stats.record_sync(&outcome);
                Some(outcome)
            }
            None => None,
        };

        bump(&self.stats.delivered);
        RelayOutcome::Delivered {
            event: kind,
            task_id: event.task_id,
            log_posted,
            card,
        }
    }

    async fn post_log_message(
        &self,
        event: &InboundEvent,
        kind: &EventKind,
        title: &str,
        status: &str,
    ) -> Option<bool> {
        let (Some(chat), Some(channel)) = (&self.chat, &self.log_channel) else {
            return None;
        };

        let url = task_url(&self.task_url_template, event.task_id.as_deref());
        let text = render_event(&MessageContext {
            kind,
            title,
            task_id: event.task_id.as_deref(),
            status,
            author: event.author.as_deref(),
            message: event.message.as_deref(),
            tags: &event.tags,
            task_url: url.as_deref(),
        });

        match chat.post_message(channel, &text).await {
            Ok(posted) => {
                tracing::debug!(channel = %posted.channel, message_ref = %posted.message_ref, "log message posted");
                Some(true)
            }
            Err(err) => {
                bump(&self.stats.log_posts_failed);
                tracing::error!(channel = %channel, error = %err, "failed to post log message");
                Some(false)
            }
        }
    }

    async fn resolve_title(&self, event: &InboundEvent) -> String {
        let remembered_key = match (&self.store, event.task_id.as_deref()) {
            (Some(store), Some(id)) if self.remember_titles => {
                Some((store, title_key(&self.namespace, id)))
            }
            _ => None,
        };

        if let Some(title) = &event.raw_title {
            if let Some((store, key)) = &remembered_key {
                if let Err(err) = store.set(key, &Value::String(title.clone())).await {
                    bump(&self.stats.store_failures);
                    tracing::warn!(key = %key, error = %err, "failed to remember task title");
                }
            }
            return title.clone();
        }

        if let Some((store, key)) = &remembered_key {
            match store.get(key).await {
                Ok(Some(Value::String(title))) if !title.trim().is_empty() => return title,
                Ok(_) => {}
                Err(err) => {
                    bump(&self.stats.store_failures);
                    tracing::warn!(key = %key, error = %err, "failed to read remembered task title");
                }
            }
        }

        event
            .task_id
            .as_deref()
            .map_or_else(|| UNTITLED.to_string(), |id| format!("Task #{id}"))
    }
}

/// Builder for [`RelayService`].
pub struct RelayServiceBuilder {
    service: RelayService,
    card_channel: Option<String>,
}

impl RelayServiceBuilder {
    /// Chat client used for log messages and cards.
    #[must_use]
    pub fn chat(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.service.chat = Some(chat);
        self
    }

    /// Correlation store for card locators and remembered titles.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CorrelationStore>) -> Self {
        self.service.store = Some(store);
        self
    }

    /// Channel receiving one log message per event.
    #[must_use]
    pub fn log_channel(mut self, channel: Option<String>) -> Self {
        self.service.log_channel = channel;
        self
    }

    /// Channel holding task cards; cards are disabled without one.
    #[must_use]
    pub fn card_channel(mut self, channel: Option<String>) -> Self {
        self.card_channel = channel;
        self
    }

    /// Store key namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.service.namespace = namespace.into();
        self
    }

    /// Task link template.
    #[must_use]
    pub fn task_url_template(mut self, template: impl Into<String>) -> Self {
        self.service.task_url_template = template.into();
        self
    }

    /// Persist titles so untitled follow-up events keep them.
    #[must_use]
    pub const fn remember_titles(mut self, remember: bool) -> Self {
        self.service.remember_titles = remember;
        self
    }

    /// Finish building. Cards are only enabled when a card channel, a chat
    /// client and a store are all present.
    pub fn build(mut self) -> RelayService {
        if let (Some(channel), Some(chat), Some(store)) = (
            self.card_channel.take(),
            self.service.chat.clone(),
            self.service.store.clone(),
        ) {
            self.service.cards = Some(CardSynchronizer::new(
                chat,
                store,
                channel,
                self.service.namespace.clone(),
            ));
        }
        self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recording::{ChatCall, RecordingChatClient, RecordingStore};
    use crate::domain::models::{CardLocator, FilterConfig, MatchRule};
    use serde_json::json;

    struct Harness {
        chat: Arc<RecordingChatClient>,
        store: Arc<RecordingStore>,
        relay: RelayService,
    }

    fn harness(filters: FilterConfig, remember_titles: bool) -> Harness {
        let chat = Arc::new(RecordingChatClient::new());
        let store = Arc::new(RecordingStore::new());
        let relay = RelayService::builder(
            FilterEngine::new(&filters).unwrap(),
            StatusLabels::default(),
        )
        .chat(chat.clone())
        .store(store.clone())
        .log_channel(Some("C-LOG".to_string()))
        .card_channel(Some("C-LIST".to_string()))
        .namespace("deskfy")
        .task_url_template("https://app.deskfy.io/r/{task_id}")
        .remember_titles(remember_titles)
        .build();
        Harness { chat, store, relay }
    }

    #[tokio::test]
    async fn test_delivered_event_posts_log_and_card() {
        let h = harness(FilterConfig::default(), false);
        let body = json!({
            "event": "UPDATE_TASK",
            "data": { "id": 42, "title": "Banner A", "status": "PROGRESS", "tags": ["Verão"] }
        });

        let outcome = h.relay.process(&body).await;

        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                event: EventKind::UpdateTask,
                task_id: Some("42".to_string()),
                log_posted: Some(true),
                card: Some(SyncOutcome::Created(CardLocator::new("C-LIST", "ts-2"))),
            }
        );
        let posts = h.chat.posts();
        let ChatCall::Post { channel, text } = &posts[0] else {
            panic!("expected log post first");
        };
        assert_eq!(channel, "C-LOG");
        assert!(text.contains("🔄 *Task updated!*"));
        assert!(text.contains("*New status:* In production"));
        assert!(text.contains("https://app.deskfy.io/r/42"));
        assert_eq!(
            h.store.peek("deskfy:42").await,
            Some(json!({ "channel": "C-LIST", "ts": "ts-2" }))
        );

        let stats = h.relay.stats();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.cards_created, 1);
    }

    #[tokio::test]
    async fn test_filtered_event_makes_no_calls() {
        let filters = FilterConfig {
            blocked_geo: vec![MatchRule::contains("geo sp")],
            ..FilterConfig::default()
        };
        let h = harness(filters, false);

        let outcome = h
            .relay
            .process(&json!({ "event": "NEW_TASK", "data": { "id": 1, "title": "Menu GEO SP" } }))
            .await;

        assert!(matches!(outcome, RelayOutcome::Ignored(IgnoreReason::GeoBlocked { .. })));
        assert!(h.chat.calls().is_empty());
        assert!(h.store.calls().is_empty());
        assert_eq!(h.relay.stats().ignored, 1);
    }

    #[tokio::test]
    async fn test_missing_task_id_skips_card() {
        let h = harness(FilterConfig::default(), false);

        let outcome = h.relay.process(&json!({ "title": "Loose note" })).await;

        let RelayOutcome::Delivered { card, log_posted, .. } = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(card, Some(SyncOutcome::Skipped));
        assert_eq!(log_posted, Some(true));
        assert!(h.store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_chat_outage_is_swallowed() {
        let h = harness(FilterConfig::default(), false);
        h.chat.set_fail_posts(true);

        let outcome = h.relay.process(&json!({ "id": "9", "name": "Flyer" })).await;

        let RelayOutcome::Delivered { card, log_posted, .. } = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(log_posted, Some(false));
        assert_eq!(card, Some(SyncOutcome::CreateFailed));
        let stats = h.relay.stats();
        assert_eq!(stats.log_posts_failed, 1);
        assert_eq!(stats.card_creates_failed, 1);
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_title_fallbacks() {
        let h = harness(FilterConfig::default(), false);
        h.relay.process(&json!({ "event": "NEW_TASK_COMMENT", "data": { "task": { "id": 5 } } })).await;
        h.relay.process(&json!({ "event": "NEW_TASK_COMMENT", "data": {} })).await;

        let posts = h.chat.posts();
        let texts: Vec<&str> = posts
            .iter()
            .filter_map(|call| match call {
                ChatCall::Post { channel, text } if channel == "C-LOG" => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts[0].contains("*Title:* Task #5"));
        assert!(texts[1].contains(&format!("*Title:* {UNTITLED}")));
    }

    #[tokio::test]
    async fn test_remembered_title_fills_untitled_event() {
        let h = harness(FilterConfig::default(), true);
        h.relay
            .process(&json!({ "event": "NEW_TASK", "data": { "id": 5, "title": "Banner B" } }))
            .await;

        h.relay
            .process(&json!({ "event": "NEW_TASK_COMMENT", "data": { "id": 5, "comment": "ok" } }))
            .await;

        assert_eq!(h.store.peek("deskfy:title:5").await, Some(json!("Banner B")));
        let last_log = h
            .chat
            .posts()
            .into_iter()
            .filter_map(|call| match call {
                ChatCall::Post { channel, text } if channel == "C-LOG" => Some(text),
                _ => None,
            })
            .last()
            .unwrap();
        assert!(last_log.contains("*Title:* Banner B"));
        assert!(last_log.contains("*Comment:* ok"));
    }

    #[tokio::test]
    async fn test_without_card_channel_no_store_access() {
        let chat = Arc::new(RecordingChatClient::new());
        let store = Arc::new(RecordingStore::new());
        let relay = RelayService::builder(
            FilterEngine::new(&FilterConfig::default()).unwrap(),
            StatusLabels::default(),
        )
        .chat(chat.clone())
        .store(store.clone())
        .log_channel(Some("C-LOG".to_string()))
        .build();

        let outcome = relay.process(&json!({ "id": 1, "title": "T" })).await;

        assert!(matches!(outcome, RelayOutcome::Delivered { card: None, .. }));
        assert_eq!(chat.calls().len(), 1);
        assert!(store.calls().is_empty());
    }
}
