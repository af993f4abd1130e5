//! Card locators stored in the correlation store.

use serde::{Deserialize, Serialize};

/// Where a task's card lives in the chat provider.
///
/// Written once, when the card is first posted, and never rewritten: later
/// notifications only change the message content. The message reference is
/// stored under `ts` (Slack's message timestamp) to stay compatible with
/// locators written by earlier deployments, some of which carry no channel;
/// an empty `channel` means the configured card channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLocator {
    /// Channel holding the card. Empty when the stored record had none.
    #[serde(default)]
    pub channel: String,
    /// Provider handle for the message.
    #[serde(rename = "ts", alias = "message_ref")]
    pub message_ref: String,
}

impl CardLocator {
    /// Create a locator.
    pub fn new(channel: impl Into<String>, message_ref: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            message_ref: message_ref.into(),
        }
    }
}

/// Correlation store key for a task's card: `<namespace>:<task_id>`.
pub fn card_key(namespace: &str, task_id: &str) -> String {
    format!("{namespace}:{task_id}")
}

/// Correlation store key for a task's remembered title.
pub fn title_key(namespace: &str, task_id: &str) -> String {
    format!("{namespace}:title:{task_id}")
}
