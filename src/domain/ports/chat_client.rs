//! Chat provider port.
//!
//! The relay only needs two chat operations: post a message and rewrite a
//! message it posted earlier. Adapters report provider-side rejections
//! (e.g. Slack's `ok: false`) as [`DomainError::ChatProvider`].
//!
//! [`DomainError::ChatProvider`]: crate::domain::errors::DomainError::ChatProvider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// A message accepted by the chat provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    /// Channel the provider stored the message in. Providers may resolve a
    /// channel name to an identifier, so this can differ from the request.
    pub channel: String,
    /// Handle needed to edit the message later.
    pub message_ref: String,
}

/// Port for the team chat provider.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post `text` to `channel`.
    async fn post_message(&self, channel: &str, text: &str) -> DomainResult<PostedMessage>;

    /// Replace the content of a previously posted message.
    async fn update_message(&self, channel: &str, message_ref: &str, text: &str)
        -> DomainResult<()>;
}
