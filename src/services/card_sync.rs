//! Card synchronization.
//!
//! Keeps exactly one chat message (the "card") per Deskfy task. The first
//! notification for a task posts the card and stores its locator in the
//! correlation store; every later notification rewrites that same message.
//!
//! The correlation store is the only record of which cards exist. Nothing
//! is cached in process: relay instances are stateless and may run
//! concurrently. Creation persists the locator with a conditional write, so
//! when two instances race on a fresh task only one locator survives; the
//! loser's message is orphaned and its content is pushed to the winner's
//! card instead.
//!
//! A new locator records the channel the provider reports for the posted
//! message rather than the configured card channel: Slack accepts channel
//! names but answers with channel IDs, and `chat.update` needs the ID.
//! Stored locators with no channel are updated in the configured card
//! channel.
//!
//! Chat and store failures never propagate. They are logged and reported in
//! the returned [`SyncOutcome`] so the webhook source is not asked to retry.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::errors::DomainError;
use crate::domain::models::{card_key, CardLocator, NotificationRecord};
use crate::domain::ports::{ChatClient, CorrelationStore};
use crate::services::rendering::render_card;

/// What a [`CardSynchronizer::sync`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The record had no task ID; nothing was called.
    Skipped,
    /// A new card was posted and its locator stored.
    Created(CardLocator),
    /// The existing card was rewritten.
    Updated(CardLocator),
    /// Another instance stored a locator first; its card was rewritten and
    /// the message posted by this call was orphaned.
    LostRace {
        /// Locator that won.
        winner: CardLocator,
        /// Message posted by this call and left behind.
        orphaned: CardLocator,
    },
    /// Posting the card failed; nothing was stored.
    CreateFailed,
    /// Rewriting the card failed; the locator is unchanged.
    UpdateFailed(CardLocator),
    /// The correlation store failed or held an unreadable locator.
    StoreFailed,
}

impl SyncOutcome {
    /// Short machine-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::LostRace { .. } => "lost_race",
            Self::CreateFailed => "create_failed",
            Self::UpdateFailed(_) => "update_failed",
            Self::StoreFailed => "store_failed",
        }
    }
}

/// Creates or updates the card for each notification record.
pub struct CardSynchronizer {
    chat: Arc<dyn ChatClient>,
    store: Arc<dyn CorrelationStore>,
    card_channel: String,
    namespace: String,
}

impl CardSynchronizer {
    /// Create a synchronizer posting new cards to `card_channel` and keying
    /// locators under `namespace`.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        store: Arc<dyn CorrelationStore>,
        card_channel: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            store,
            card_channel: card_channel.into(),
            namespace: namespace.into(),
        }
    }

    /// Channel new cards are posted to.
    pub fn card_channel(&self) -> &str {
        &self.card_channel
    }

    /// Bring the task's card in line with `record`.
    #[tracing::instrument(skip(self, record), fields(task_id = ?record.task_id))]
    pub async fn sync(&self, record: &NotificationRecord) -> SyncOutcome {
        let Some(task_id) = record.correlation_id() else {
            tracing::info!("no task id on notification, skipping card sync");
            return SyncOutcome::Skipped;
        };

        let text = render_card(record);
        let key = card_key(&self.namespace, task_id);

        let existing = match self.store.get(&key).await {
            Ok(existing) => existing,
            Err(err) => {
                tracing::error!(key = %key, error = %err, "card lookup failed");
                return SyncOutcome::StoreFailed;
            }
        };

        match existing {
            None => self.create(&key, &text).await,
            Some(value) => match parse_locator(&key, value) {
                Some(locator) => self.update(locator, &text).await,
                None => SyncOutcome::StoreFailed,
            },
        }
    }

    async fn create(&self, key: &str, text: &str) -> SyncOutcome {
        let posted = match self.chat.post_message(&self.card_channel, text).await {
            Ok(posted) => posted,
            Err(err) => {
                tracing::error!(
                    channel = %self.card_channel,
                    error = %err,
                    "failed to post card, next notification will retry creation"
                );
                return SyncOutcome::CreateFailed;
            }
        };

        let locator = CardLocator::new(posted.channel, posted.message_ref);
        let value = match serde_json::to_value(&locator) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(key = %key, error = %err, "failed to encode card locator");
                return SyncOutcome::StoreFailed;
            }
        };

        match self.store.set_if_absent(key, &value).await {
            Ok(true) => {
                tracing::info!(
                    key = %key,
                    channel = %locator.channel,
                    message_ref = %locator.message_ref,
                    "card created"
                );
                SyncOutcome::Created(locator)
            }
            Ok(false) => self.resolve_lost_race(key, locator, text).await,
            Err(err) => {
                tracing::error!(
                    key = %key,
                    channel = %locator.channel,
                    message_ref = %locator.message_ref,
                    error = %err,
                    "card posted but locator not stored, card is orphaned"
                );
                SyncOutcome::StoreFailed
            }
        }
    }

    async fn resolve_lost_race(&self, key: &str, orphaned: CardLocator, text: &str) -> SyncOutcome {
        tracing::warn!(
            key = %key,
            channel = %orphaned.channel,
            message_ref = %orphaned.message_ref,
            "another instance created this card first, orphaning the message just posted"
        );

        let winner = match self.store.get(key).await {
            Ok(Some(value)) => parse_locator(key, value),
            Ok(None) => None,
            Err(err) => {
                tracing::error!(key = %key, error = %err, "card lookup after lost race failed");
                None
            }
        };
        let Some(winner) = winner else {
            return SyncOutcome::StoreFailed;
        };

        match self.update(winner, text).await {
            SyncOutcome::Updated(winner) => SyncOutcome::LostRace { winner, orphaned },
            other => other,
        }
    }

    async fn update(&self, mut locator: CardLocator, text: &str) -> SyncOutcome {
        if locator.channel.is_empty() {
            locator.channel.clone_from(&self.card_channel);
        }
        match self
            .chat
            .update_message(&locator.channel, &locator.message_ref, text)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    channel = %locator.channel,
                    message_ref = %locator.message_ref,
                    "card updated"
                );
                SyncOutcome::Updated(locator)
            }
            Err(err) => {
                tracing::error!(
                    channel = %locator.channel,
                    message_ref = %locator.message_ref,
                    error = %err,
                    "failed to update card"
                );
                SyncOutcome::UpdateFailed(locator)
            }
        }
    }
}

fn parse_locator(key: &str, value: Value) -> Option<CardLocator> {
    match serde_json::from_value::<CardLocator>(value) {
        Ok(locator) => Some(locator),
        Err(err) => {
            let err = DomainError::from(err);
            tracing::error!(key = %key, error = %err, "stored card locator is unreadable, leaving it untouched");
            None
        }
    }
}
